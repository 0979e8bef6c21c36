//! Reversible (RCT) and irreversible (ICT) color transforms (spec.md §4.2).
//!
//! Both run only across the first three components, and only when the
//! coding style enables a multi-component transform, applied directly to
//! fully-gathered per-component sample arrays (the tile layer already holds
//! a whole tile-component in memory by the time either transform runs, so
//! there is no row-at-a-time interleaving left to stash against).

/// Forward reversible color transform (RGB -> YCbCr-like), exact integer
/// inverse of [`inverse_rct`].
pub fn forward_rct(r: &[i32], g: &[i32], b: &[i32]) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
    debug_assert_eq!(r.len(), g.len());
    debug_assert_eq!(r.len(), b.len());
    let n = r.len();
    let mut y = Vec::with_capacity(n);
    let mut cb = Vec::with_capacity(n);
    let mut cr = Vec::with_capacity(n);
    for i in 0..n {
        y.push((r[i] + 2 * g[i] + b[i]).div_euclid(4));
        cb.push(b[i] - g[i]);
        cr.push(r[i] - g[i]);
    }
    (y, cb, cr)
}

/// Inverse reversible color transform.
pub fn inverse_rct(y: &[i32], cb: &[i32], cr: &[i32]) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
    let n = y.len();
    let mut r = Vec::with_capacity(n);
    let mut g = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    for i in 0..n {
        let g_i = y[i] - (cb[i] + cr[i]).div_euclid(4);
        r.push(cr[i] + g_i);
        g.push(g_i);
        b.push(cb[i] + g_i);
    }
    (r, g, b)
}

const ICT_KR: f32 = 0.299;
const ICT_KG: f32 = 0.587;
const ICT_KB: f32 = 0.114;
const ICT_CB_R: f32 = -0.16875;
const ICT_CB_G: f32 = -0.33126;
const ICT_CB_B: f32 = 0.5;
const ICT_CR_R: f32 = 0.5;
const ICT_CR_G: f32 = -0.41869;
const ICT_CR_B: f32 = -0.08131;

/// Forward irreversible color transform.
pub fn forward_ict(r: &[f32], g: &[f32], b: &[f32]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let n = r.len();
    let mut y = Vec::with_capacity(n);
    let mut cb = Vec::with_capacity(n);
    let mut cr = Vec::with_capacity(n);
    for i in 0..n {
        y.push(ICT_KR * r[i] + ICT_KG * g[i] + ICT_KB * b[i]);
        cb.push(ICT_CB_R * r[i] + ICT_CB_G * g[i] + ICT_CB_B * b[i]);
        cr.push(ICT_CR_R * r[i] + ICT_CR_G * g[i] + ICT_CR_B * b[i]);
    }
    (y, cb, cr)
}

/// Inverse irreversible color transform, the exact algebraic inverse of the
/// 3x3 matrix in [`forward_ict`].
pub fn inverse_ict(y: &[f32], cb: &[f32], cr: &[f32]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let n = y.len();
    let mut r = Vec::with_capacity(n);
    let mut g = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    for i in 0..n {
        r.push(y[i] + 1.402 * cr[i]);
        g.push(y[i] - 0.344136 * cb[i] - 0.714136 * cr[i]);
        b.push(y[i] + 1.772 * cb[i]);
    }
    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rct_round_trips_exactly() {
        let r = vec![10, 200, -5, 255];
        let g = vec![40, 90, 60, 0];
        let b = vec![70, 5, 120, 255];
        let (y, cb, cr) = forward_rct(&r, &g, &b);
        let (r2, g2, b2) = inverse_rct(&y, &cb, &cr);
        assert_eq!(r, r2);
        assert_eq!(g, g2);
        assert_eq!(b, b2);
    }

    #[test]
    fn ict_round_trips_within_float_tolerance() {
        let r = vec![10.0, 200.0, -5.0];
        let g = vec![40.0, 90.0, 60.0];
        let b = vec![70.0, 5.0, 120.0];
        let (y, cb, cr) = forward_ict(&r, &g, &b);
        let (r2, g2, b2) = inverse_ict(&y, &cb, &cr);
        for i in 0..r.len() {
            assert!((r[i] - r2[i]).abs() < 1e-3);
            assert!((g[i] - g2[i]).abs() < 1e-3);
            assert!((b[i] - b2[i]).abs() < 1e-3);
        }
    }
}
