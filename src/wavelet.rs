//! Forward/inverse 5/3 reversible and 9/7 irreversible DWT (spec.md §4.3).
//!
//! Each level is a separable lifting transform: a vertical pass down each
//! column followed by a horizontal pass along each row (forward), reversed
//! on decode. Both passes reuse the same 1D lifting kernels, operating on a
//! [`LineBuffer`] so that whole-sample symmetric boundary extension is
//! applied uniformly regardless of axis.

use crate::line_buffer::LineBuffer;

const ALPHA: f32 = -1.586_134_3;
const BETA: f32 = -0.052_980_118;
const GAMMA: f32 = 0.882_911_08;
const DELTA: f32 = 0.443_506_85;
const K: f32 = 1.230_174_1;

/// Forward 5/3 reversible lifting on one row/column of integer samples,
/// returning (L, H) subsequences (spec.md §4.3's predict/update formulas).
pub fn forward_53_1d(samples: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let width = samples.len() as isize;
    let mut line: LineBuffer<i32> = LineBuffer::new(samples.len());
    line.fill_interior(samples);
    line.extend_symmetric();

    let mut idx = -1isize;
    while idx <= width {
        let a = line.get(idx - 1);
        let b = line.get(idx + 1);
        let pred = line.get(idx) - (a + b).div_euclid(2);
        line.set(idx, pred);
        idx += 2;
    }

    let mut idx = 0isize;
    while idx < width {
        let a = line.get(idx - 1);
        let b = line.get(idx + 1);
        let upd = line.get(idx) + (a + b + 2).div_euclid(4);
        line.set(idx, upd);
        idx += 2;
    }

    let l: Vec<i32> = (0..width).step_by(2).map(|i| line.get(i)).collect();
    let h: Vec<i32> = (1..width).step_by(2).map(|i| line.get(i)).collect();
    (l, h)
}

/// Inverse of [`forward_53_1d`].
pub fn inverse_53_1d(l: &[i32], h: &[i32]) -> Vec<i32> {
    let width = (l.len() + h.len()) as isize;
    let mut line: LineBuffer<i32> = LineBuffer::new(width as usize);
    for (i, &v) in l.iter().enumerate() {
        line.set(2 * i as isize, v);
    }
    for (i, &v) in h.iter().enumerate() {
        line.set(2 * i as isize + 1, v);
    }
    line.extend_symmetric();

    let mut idx = 0isize;
    while idx < width {
        let a = line.get(idx - 1);
        let b = line.get(idx + 1);
        let v = line.get(idx) - (a + b + 2).div_euclid(4);
        line.set(idx, v);
        idx += 2;
    }
    line.extend_symmetric();

    let mut idx = -1isize;
    while idx <= width {
        let a = line.get(idx - 1);
        let b = line.get(idx + 1);
        let v = line.get(idx) + (a + b).div_euclid(2);
        line.set(idx, v);
        idx += 2;
    }

    (0..width).map(|i| line.get(i)).collect()
}

/// Forward 9/7 irreversible lifting: four floating lifting steps plus the
/// final K / 1/K scaling (spec.md §4.3).
pub fn forward_97_1d(samples: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let width = samples.len() as isize;
    let mut line: LineBuffer<f32> = LineBuffer::new(samples.len());
    line.fill_interior(samples);
    line.extend_symmetric();

    lift_step(&mut line, width, ALPHA, true);
    lift_step(&mut line, width, BETA, false);
    lift_step(&mut line, width, GAMMA, true);
    lift_step(&mut line, width, DELTA, false);

    let mut idx = 0isize;
    while idx < width {
        let v = line.get(idx) / K;
        line.set(idx, v);
        idx += 2;
    }
    let mut idx = 1isize;
    while idx < width {
        let v = line.get(idx) * K;
        line.set(idx, v);
        idx += 2;
    }

    let l: Vec<f32> = (0..width).step_by(2).map(|i| line.get(i)).collect();
    let h: Vec<f32> = (1..width).step_by(2).map(|i| line.get(i)).collect();
    (l, h)
}

/// One floating lifting step applied at odd (`predict_odd = true`) or even
/// positions, using the just-updated neighbor values and `coeff`.
fn lift_step(line: &mut LineBuffer<f32>, width: isize, coeff: f32, predict_odd: bool) {
    line.extend_symmetric();
    let (mut idx, cmp): (isize, fn(isize, isize) -> bool) = if predict_odd {
        (-1, |i, w| i <= w)
    } else {
        (0, |i, w| i < w)
    };
    while cmp(idx, width) {
        let a = line.get(idx - 1);
        let b = line.get(idx + 1);
        let v = line.get(idx) + coeff * (a + b);
        line.set(idx, v);
        idx += 2;
    }
}

/// Inverse of [`forward_97_1d`].
pub fn inverse_97_1d(l: &[f32], h: &[f32]) -> Vec<f32> {
    let width = (l.len() + h.len()) as isize;
    let mut line: LineBuffer<f32> = LineBuffer::new(width as usize);
    for (i, &v) in l.iter().enumerate() {
        line.set(2 * i as isize, v);
    }
    for (i, &v) in h.iter().enumerate() {
        line.set(2 * i as isize + 1, v);
    }

    let mut idx = 0isize;
    while idx < width {
        let v = line.get(idx) * K;
        line.set(idx, v);
        idx += 2;
    }
    let mut idx = 1isize;
    while idx < width {
        let v = line.get(idx) / K;
        line.set(idx, v);
        idx += 2;
    }

    lift_step(&mut line, width, -DELTA, false);
    lift_step(&mut line, width, -GAMMA, true);
    lift_step(&mut line, width, -BETA, false);
    lift_step(&mut line, width, -ALPHA, true);

    (0..width).map(|i| line.get(i)).collect()
}

/// A single-level 2D subband decomposition of a tile-component (or parent
/// LL) rectangle: vertical pass first, then horizontal, per spec.md §4.3.
pub struct Subbands<T> {
    pub ll: Vec<T>,
    pub hl: Vec<T>,
    pub lh: Vec<T>,
    pub hh: Vec<T>,
    pub ll_w: usize,
    pub ll_h: usize,
}

pub fn forward_level_53(samples: &[i32], w: usize, h: usize) -> Subbands<i32> {
    // Vertical pass: lift each column.
    let mut low_rows = vec![0i32; 0];
    let mut high_rows = vec![0i32; 0];
    let lh_count = (h + 1) / 2;
    let hh_count = h / 2;
    let mut col_l = vec![vec![0i32; lh_count]; w];
    let mut col_h = vec![vec![0i32; hh_count]; w];
    for x in 0..w {
        let column: Vec<i32> = (0..h).map(|y| samples[y * w + x]).collect();
        let (l, hi) = forward_53_1d(&column);
        col_l[x] = l;
        col_h[x] = hi;
    }
    let _ = (&mut low_rows, &mut high_rows);

    // Horizontal pass on each of the two vertical bands.
    let mut ll = Vec::with_capacity(lh_count * ((w + 1) / 2));
    let mut hl = Vec::with_capacity(lh_count * (w / 2));
    let mut lh = Vec::with_capacity(hh_count * ((w + 1) / 2));
    let mut hh = Vec::with_capacity(hh_count * (w / 2));
    for y in 0..lh_count {
        let row: Vec<i32> = (0..w).map(|x| col_l[x][y]).collect();
        let (l, hi) = forward_53_1d(&row);
        ll.extend(l);
        hl.extend(hi);
    }
    for y in 0..hh_count {
        let row: Vec<i32> = (0..w).map(|x| col_h[x][y]).collect();
        let (l, hi) = forward_53_1d(&row);
        lh.extend(l);
        hh.extend(hi);
    }
    Subbands {
        ll,
        hl,
        lh,
        hh,
        ll_w: (w + 1) / 2,
        ll_h: lh_count,
    }
}

pub fn inverse_level_53(sb: &Subbands<i32>, w: usize, h: usize) -> Vec<i32> {
    let lh_count = (h + 1) / 2;
    let hh_count = h / 2;
    let ll_w = (w + 1) / 2;
    let hl_w = w / 2;

    let mut col_l = vec![vec![0i32; lh_count]; w];
    let mut col_h = vec![vec![0i32; hh_count]; w];
    for y in 0..lh_count {
        let l_row = &sb.ll[y * ll_w..(y + 1) * ll_w];
        let h_row = &sb.hl[y * hl_w..(y + 1) * hl_w];
        let row = inverse_53_1d(l_row, h_row);
        for x in 0..w {
            col_l[x][y] = row[x];
        }
    }
    for y in 0..hh_count {
        let l_row = &sb.lh[y * ll_w..(y + 1) * ll_w];
        let h_row = &sb.hh[y * hl_w..(y + 1) * hl_w];
        let row = inverse_53_1d(l_row, h_row);
        for x in 0..w {
            col_h[x][y] = row[x];
        }
    }

    let mut out = vec![0i32; w * h];
    for x in 0..w {
        let column = inverse_53_1d(&col_l[x], &col_h[x]);
        for y in 0..h {
            out[y * w + x] = column[y];
        }
    }
    out
}

pub fn forward_level_97(samples: &[f32], w: usize, h: usize) -> Subbands<f32> {
    let lh_count = (h + 1) / 2;
    let hh_count = h / 2;
    let mut col_l = vec![vec![0f32; lh_count]; w];
    let mut col_h = vec![vec![0f32; hh_count]; w];
    for x in 0..w {
        let column: Vec<f32> = (0..h).map(|y| samples[y * w + x]).collect();
        let (l, hi) = forward_97_1d(&column);
        col_l[x] = l;
        col_h[x] = hi;
    }

    let mut ll = Vec::with_capacity(lh_count * ((w + 1) / 2));
    let mut hl = Vec::with_capacity(lh_count * (w / 2));
    let mut lh = Vec::with_capacity(hh_count * ((w + 1) / 2));
    let mut hh = Vec::with_capacity(hh_count * (w / 2));
    for y in 0..lh_count {
        let row: Vec<f32> = (0..w).map(|x| col_l[x][y]).collect();
        let (l, hi) = forward_97_1d(&row);
        ll.extend(l);
        hl.extend(hi);
    }
    for y in 0..hh_count {
        let row: Vec<f32> = (0..w).map(|x| col_h[x][y]).collect();
        let (l, hi) = forward_97_1d(&row);
        lh.extend(l);
        hh.extend(hi);
    }
    Subbands {
        ll,
        hl,
        lh,
        hh,
        ll_w: (w + 1) / 2,
        ll_h: lh_count,
    }
}

pub fn inverse_level_97(sb: &Subbands<f32>, w: usize, h: usize) -> Vec<f32> {
    let lh_count = (h + 1) / 2;
    let hh_count = h / 2;
    let ll_w = (w + 1) / 2;
    let hl_w = w / 2;

    let mut col_l = vec![vec![0f32; lh_count]; w];
    let mut col_h = vec![vec![0f32; hh_count]; w];
    for y in 0..lh_count {
        let l_row = &sb.ll[y * ll_w..(y + 1) * ll_w];
        let h_row = &sb.hl[y * hl_w..(y + 1) * hl_w];
        let row = inverse_97_1d(l_row, h_row);
        for x in 0..w {
            col_l[x][y] = row[x];
        }
    }
    for y in 0..hh_count {
        let l_row = &sb.lh[y * ll_w..(y + 1) * ll_w];
        let h_row = &sb.hh[y * hl_w..(y + 1) * hl_w];
        let row = inverse_97_1d(l_row, h_row);
        for x in 0..w {
            col_h[x][y] = row[x];
        }
    }

    let mut out = vec![0f32; w * h];
    for x in 0..w {
        let column = inverse_97_1d(&col_l[x], &col_h[x]);
        for y in 0..h {
            out[y * w + x] = column[y];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversible_1d_round_trips_exactly() {
        let samples = vec![10, -3, 7, 128, -128, 0, 42];
        let (l, h) = forward_53_1d(&samples);
        let back = inverse_53_1d(&l, &h);
        assert_eq!(back, samples);
    }

    #[test]
    fn reversible_1d_round_trips_even_width() {
        let samples = vec![1, 2, 3, 4, 5, 6];
        let (l, h) = forward_53_1d(&samples);
        let back = inverse_53_1d(&l, &h);
        assert_eq!(back, samples);
    }

    #[test]
    fn irreversible_1d_round_trips_within_tolerance() {
        let samples = vec![10.0, -3.0, 7.0, 128.0, -128.0, 0.0, 42.0];
        let (l, h) = forward_97_1d(&samples);
        let back = inverse_97_1d(&l, &h);
        for (a, b) in samples.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }

    #[test]
    fn reversible_2d_level_round_trips_on_awkward_size() {
        let (w, h) = (7, 5);
        let samples: Vec<i32> = (0..(w * h) as i32).collect();
        let sb = forward_level_53(&samples, w, h);
        let back = inverse_level_53(&sb, w, h);
        assert_eq!(back, samples);
    }
}
