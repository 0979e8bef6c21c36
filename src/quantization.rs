//! Scalar dead-zone quantization (spec.md §4.4), tying [`ParamQcd`]'s
//! `kmax`/`delta` into the forward/inverse operations the subband layer
//! needs.
//!
//! The reversible (5/3) path is implicit bit-shift quantization (step size
//! 1, only the guard-bit/Kmax accounting applies). The irreversible (9/7)
//! path is the dead-zone scalar quantizer: `q = sign(x) * floor(|x| / Δ)`,
//! reconstructed as `(|q| + 0.5) * Δ * sign(q)`.

use crate::markers::ParamQcd;

/// Dead-zone scalar quantization of one irreversible coefficient.
pub fn quantize_scalar(coeff: f32, step_size: f32) -> i32 {
    if step_size <= 0.0 {
        return coeff as i32;
    }
    let sign = if coeff >= 0.0 { 1.0 } else { -1.0 };
    (sign * (coeff.abs() / step_size).floor()) as i32
}

/// Inverse of [`quantize_scalar`]: reconstructs a representative value from
/// a quantization index, biased to the bin center (spec.md's convention for
/// irreversible reconstruction).
pub fn dequantize_scalar(q: i32, step_size: f32) -> f32 {
    if q == 0 {
        return 0.0;
    }
    let sign = if q > 0 { 1.0 } else { -1.0 };
    (q.unsigned_abs() as f32 + 0.5) * step_size * sign
}

/// Reversible (5/3) coefficients need no scalar quantization step; the only
/// quantization-layer concern is how many magnitude bits a coefficient may
/// need, bounded by `Kmax` for its subband.
pub fn reversible_kmax(qcd: &ParamQcd, subband_index: usize) -> u32 {
    qcd.kmax(subband_index)
}

/// Quantizes a full subband's irreversible coefficients using the QCD-
/// derived step size for that subband (`gain` is the subband's L2-norm
/// gain factor, 1.0/2.0/2.0/4.0 for LL/HL/LH/HH respectively per spec.md
/// §4.4).
pub fn quantize_subband(coefficients: &[f32], qcd: &ParamQcd, subband_index: usize, gain: f32) -> Vec<i32> {
    let step = qcd.delta(subband_index, gain);
    coefficients
        .iter()
        .map(|&c| quantize_scalar(c, step))
        .collect()
}

/// Inverse of [`quantize_subband`].
pub fn dequantize_subband(
    indices: &[i32],
    qcd: &ParamQcd,
    subband_index: usize,
    gain: f32,
) -> Vec<f32> {
    let step = qcd.delta(subband_index, gain);
    indices.iter().map(|&q| dequantize_scalar(q, step)).collect()
}

/// L2-norm gain factor for a subband orientation (spec.md §4.4).
pub fn subband_gain(is_ll: bool, is_hh: bool) -> f32 {
    if is_ll {
        1.0
    } else if is_hh {
        4.0
    } else {
        2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::QuantStyle;

    #[test]
    fn scalar_round_trips_within_one_step() {
        let step = 2.0;
        for &val in &[10.5, -3.25, 0.0, 99.9] {
            let q = quantize_scalar(val, step);
            let recon = dequantize_scalar(q, step);
            assert!((val - recon).abs() <= step);
        }
    }

    #[test]
    fn subband_round_trip_uses_qcd_delta() {
        let qcd = ParamQcd {
            guard_bits: 1,
            style: QuantStyle::ScalarExpounded,
            subband_values: vec![(5u16 << 11) | 0],
        };
        let original = vec![12.0f32, -4.0, 0.5];
        let quantized = quantize_subband(&original, &qcd, 0, 1.0);
        let recon = dequantize_subband(&quantized, &qcd, 0, 1.0);
        let step = qcd.delta(0, 1.0);
        for (o, r) in original.iter().zip(recon.iter()) {
            assert!((o - r).abs() <= step);
        }
    }

    #[test]
    fn gain_matches_orientation() {
        assert_eq!(subband_gain(true, false), 1.0);
        assert_eq!(subband_gain(false, true), 4.0);
        assert_eq!(subband_gain(false, false), 2.0);
    }
}
