use crate::error::{malformed, unsupported, CoreError};
use crate::marker_io::{MarkerReader, MarkerWriter};
use crate::markers::QCD;

/// Quantization style carried in the low 5 bits of Sqcd (spec.md §4.4).
/// Scalar derived (style 1) is part of JPEG 2000 Part 1 and is not produced
/// by this core; it is accepted on read only to report it as unsupported
/// with a precise message rather than a generic parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantStyle {
    NoQuantization,
    ScalarExpounded,
}

impl QuantStyle {
    fn to_bits(self) -> u8 {
        match self {
            QuantStyle::NoQuantization => 0,
            QuantStyle::ScalarExpounded => 2,
        }
    }

    fn from_bits(b: u8) -> Result<Self, CoreError> {
        match b {
            0 => Ok(QuantStyle::NoQuantization),
            2 => Ok(QuantStyle::ScalarExpounded),
            1 => Err(unsupported!(
                30,
                "scalar derived quantization (SPqcd style 1) is not supported"
            )),
            other => Err(malformed!(31, "unknown quantization style {other}")),
        }
    }
}

/// The QCD marker segment (spec.md §4.4, §6.1). `subband_values` holds the
/// raw per-subband field: exponent in the high bits, mantissa (irreversible
/// only) in the low 11 bits, in subband order (LL, then HL/LH/HH per
/// resolution from the coarsest to the finest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamQcd {
    pub guard_bits: u8,
    pub style: QuantStyle,
    pub subband_values: Vec<u16>,
}

impl ParamQcd {
    fn sqcd(&self) -> u8 {
        (self.guard_bits << 5) | self.style.to_bits()
    }

    pub fn write(&self, w: &mut MarkerWriter) {
        w.write_marker(QCD);
        let at = w.reserve_length();
        w.write_u8(self.sqcd());
        match self.style {
            QuantStyle::NoQuantization => {
                for &v in &self.subband_values {
                    w.write_u8((v >> 3) as u8);
                }
            }
            QuantStyle::ScalarExpounded => {
                for &v in &self.subband_values {
                    w.write_u16(v);
                }
            }
        }
        w.patch_length(at);
    }

    pub fn read(r: &mut MarkerReader, num_decompositions: u32) -> Result<Self, CoreError> {
        let lqcd = r.read_u16()? as usize;
        let sqcd = r.read_u8()?;
        let guard_bits = sqcd >> 5;
        let style = QuantStyle::from_bits(sqcd & 0x1F)?;
        let num_subbands = 1 + 3 * num_decompositions as usize;
        let mut subband_values = Vec::with_capacity(num_subbands);
        let body_len = match style {
            QuantStyle::NoQuantization => {
                for _ in 0..num_subbands {
                    subband_values.push((r.read_u8()? as u16) << 3);
                }
                num_subbands
            }
            QuantStyle::ScalarExpounded => {
                for _ in 0..num_subbands {
                    subband_values.push(r.read_u16()?);
                }
                2 * num_subbands
            }
        };
        if lqcd != 3 + body_len {
            return Err(malformed!(32, "QCD length {lqcd} inconsistent with its body"));
        }
        Ok(Self {
            guard_bits,
            style,
            subband_values,
        })
    }

    /// Kmax for a given subband index (0 = LL, else 1..=3*num_decomp in
    /// coarse-to-fine order), per spec.md §4.4 / the original's
    /// `get_Kmax`.
    pub fn kmax(&self, subband_index: usize) -> u32 {
        let guard = self.guard_bits as u32;
        let raw = self.subband_values[subband_index] as u32;
        match self.style {
            QuantStyle::NoQuantization => {
                let exponent = raw >> 3;
                let total = guard + exponent;
                total.saturating_sub(1)
            }
            QuantStyle::ScalarExpounded => {
                let exponent = raw >> 11;
                guard + exponent.saturating_sub(1)
            }
        }
    }

    /// Reconstruction step size Δ for a subband, following spec.md §4.4:
    /// Δ = (1 + mantissa/2048) · 2^(−exponent) · gain(subband). Only
    /// meaningful for `ScalarExpounded`.
    pub fn delta(&self, subband_index: usize, gain: f32) -> f32 {
        let raw = self.subband_values[subband_index] as u32;
        let exponent = raw >> 11;
        let mantissa = raw & 0x7FF;
        let scale = 1.0 + (mantissa as f32) / 2048.0;
        scale * 2f32.powi(-(exponent as i32)) * gain
    }
}

/// The QCC marker segment: a component index followed by a QCD body
/// (spec.md §6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamQcc {
    pub component_index: u16,
    pub qcd: ParamQcd,
}

impl ParamQcc {
    pub fn write(&self, w: &mut MarkerWriter, wide_component_index: bool) {
        w.write_marker(crate::markers::QCC);
        let at = w.reserve_length();
        if wide_component_index {
            w.write_u16(self.component_index);
        } else {
            w.write_u8(self.component_index as u8);
        }
        w.write_u8(self.qcd.sqcd());
        match self.qcd.style {
            QuantStyle::NoQuantization => {
                for &v in &self.qcd.subband_values {
                    w.write_u8((v >> 3) as u8);
                }
            }
            QuantStyle::ScalarExpounded => {
                for &v in &self.qcd.subband_values {
                    w.write_u16(v);
                }
            }
        }
        w.patch_length(at);
    }

    pub fn read(
        r: &mut MarkerReader,
        num_decompositions: u32,
        wide_component_index: bool,
    ) -> Result<Self, CoreError> {
        let lqcc = r.read_u16()? as usize;
        let component_index = if wide_component_index {
            r.read_u16()?
        } else {
            r.read_u8()? as u16
        };
        let sqcd = r.read_u8()?;
        let guard_bits = sqcd >> 5;
        let style = QuantStyle::from_bits(sqcd & 0x1F)?;
        let num_subbands = 1 + 3 * num_decompositions as usize;
        let mut subband_values = Vec::with_capacity(num_subbands);
        let body_len = match style {
            QuantStyle::NoQuantization => {
                for _ in 0..num_subbands {
                    subband_values.push((r.read_u8()? as u16) << 3);
                }
                num_subbands
            }
            QuantStyle::ScalarExpounded => {
                for _ in 0..num_subbands {
                    subband_values.push(r.read_u16()?);
                }
                2 * num_subbands
            }
        };
        let comp_field_len = if wide_component_index { 2 } else { 1 };
        if lqcc != 2 + comp_field_len + 1 + body_len {
            return Err(malformed!(33, "QCC length {lqcc} inconsistent with its body"));
        }
        Ok(Self {
            component_index,
            qcd: ParamQcd {
                guard_bits,
                style,
                subband_values,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qcd_round_trip_reversible() {
        let qcd = ParamQcd {
            guard_bits: 1,
            style: QuantStyle::NoQuantization,
            subband_values: vec![8 << 3; 1 + 3 * 2],
        };
        let mut w = MarkerWriter::new();
        qcd.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert_eq!(ParamQcd::read(&mut r, 2).unwrap(), qcd);
    }

    #[test]
    fn qcd_round_trip_irreversible() {
        let qcd = ParamQcd {
            guard_bits: 1,
            style: QuantStyle::ScalarExpounded,
            subband_values: vec![(5u16 << 11) | 123; 1 + 3 * 3],
        };
        let mut w = MarkerWriter::new();
        qcd.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert_eq!(ParamQcd::read(&mut r, 3).unwrap(), qcd);
    }

    #[test]
    fn kmax_matches_reversible_formula() {
        let qcd = ParamQcd {
            guard_bits: 1,
            style: QuantStyle::NoQuantization,
            subband_values: vec![10 << 3],
        };
        assert_eq!(qcd.kmax(0), 1 + 10 - 1);
    }
}
