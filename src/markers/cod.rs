use crate::error::{malformed, unsupported, CoreError};
use crate::marker_io::{MarkerReader, MarkerWriter};
use crate::markers::COD;

/// Progression order carried in SGCod (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionOrder {
    Lrcp,
    Rlcp,
    Rpcl,
    Pcrl,
    Cprl,
}

impl ProgressionOrder {
    fn to_byte(self) -> u8 {
        match self {
            ProgressionOrder::Lrcp => 0,
            ProgressionOrder::Rlcp => 1,
            ProgressionOrder::Rpcl => 2,
            ProgressionOrder::Pcrl => 3,
            ProgressionOrder::Cprl => 4,
        }
    }

    fn from_byte(b: u8) -> Result<Self, CoreError> {
        Ok(match b {
            0 => ProgressionOrder::Lrcp,
            1 => ProgressionOrder::Rlcp,
            2 => ProgressionOrder::Rpcl,
            3 => ProgressionOrder::Pcrl,
            4 => ProgressionOrder::Cprl,
            other => return Err(malformed!(20, "unknown progression order byte {other}")),
        })
    }
}

/// SPcod block-coding style byte (Scb). This core implements only the HT
/// block coder, so the legacy EBCOT style bits (arithmetic bypass, reset,
/// termination, segmentation symbols) are rejected rather than modeled; the
/// vertical-causality bit is the one HT still respects (spec.md §4.5 SPP
/// pass, causal context at tile-component boundaries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockStyle {
    pub vert_causal_context: bool,
    pub ht_mixed_mode: bool,
}

impl BlockStyle {
    const VERT_CAUSAL_BIT: u8 = 1 << 3;
    const HT_BIT: u8 = 1 << 6;
    const HT_MIXED_BIT: u8 = 1 << 5;
    /// Bits this core does not implement (legacy EBCOT-only modes).
    const UNSUPPORTED_MASK: u8 = 0b0000_0111 | (1 << 4);

    fn to_byte(self) -> u8 {
        let mut b = Self::HT_BIT;
        if self.vert_causal_context {
            b |= Self::VERT_CAUSAL_BIT;
        }
        if self.ht_mixed_mode {
            b |= Self::HT_MIXED_BIT;
        }
        b
    }

    fn from_byte(b: u8) -> Result<Self, CoreError> {
        if b & Self::HT_BIT == 0 {
            return Err(unsupported!(
                21,
                "code-block style does not set the HT bit; non-HT block coding is not supported"
            ));
        }
        if b & Self::UNSUPPORTED_MASK != 0 {
            return Err(unsupported!(
                22,
                "code-block style requests legacy EBCOT modes not implemented by this core"
            ));
        }
        Ok(Self {
            vert_causal_context: b & Self::VERT_CAUSAL_BIT != 0,
            ht_mixed_mode: b & Self::HT_MIXED_BIT != 0,
        })
    }
}

/// Wavelet transform selector (SPcod's 9th byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveletKind {
    Reversible53,
    Irreversible97,
}

impl WaveletKind {
    fn to_byte(self) -> u8 {
        match self {
            WaveletKind::Reversible53 => 1,
            WaveletKind::Irreversible97 => 0,
        }
    }

    fn from_byte(b: u8) -> Result<Self, CoreError> {
        match b {
            0 => Ok(WaveletKind::Irreversible97),
            1 => Ok(WaveletKind::Reversible53),
            other => Err(malformed!(23, "unknown wavelet transform selector {other}")),
        }
    }

    pub fn is_reversible(self) -> bool {
        matches!(self, WaveletKind::Reversible53)
    }
}

/// The COD marker segment (spec.md §3.2, §3.3, §6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCod {
    pub progression_order: ProgressionOrder,
    pub num_layers: u16,
    pub use_mct: bool,
    pub num_decompositions: u32,
    pub log_block_w: u32,
    pub log_block_h: u32,
    pub block_style: BlockStyle,
    pub wavelet: WaveletKind,
    /// Per-resolution precinct size (log2 width | log2 height << 4), one
    /// entry per resolution level (num_decompositions + 1), or `None` for
    /// the default maximum precinct size.
    pub precinct_sizes: Option<Vec<u8>>,
    /// Scod bit 1: packets may carry a leading SOP marker (spec.md §4.6).
    pub sop_enabled: bool,
    /// Scod bit 2: packet headers may carry a trailing EPH marker.
    pub eph_enabled: bool,
}

impl ParamCod {
    pub fn write(&self, w: &mut MarkerWriter) {
        w.write_marker(COD);
        let at = w.reserve_length();
        let mut scod: u8 = if self.precinct_sizes.is_some() { 1 } else { 0 };
        if self.sop_enabled {
            scod |= 1 << 1;
        }
        if self.eph_enabled {
            scod |= 1 << 2;
        }
        w.write_u8(scod);
        w.write_u8(self.progression_order.to_byte());
        w.write_u16(self.num_layers);
        w.write_u8(if self.use_mct { 1 } else { 0 });
        w.write_u8(self.num_decompositions as u8);
        w.write_u8((self.log_block_w - 2) as u8);
        w.write_u8((self.log_block_h - 2) as u8);
        w.write_u8(self.block_style.to_byte());
        w.write_u8(self.wavelet.to_byte());
        if let Some(sizes) = &self.precinct_sizes {
            for &s in sizes {
                w.write_u8(s);
            }
        }
        w.patch_length(at);
    }

    pub fn read(r: &mut MarkerReader) -> Result<Self, CoreError> {
        let lcod = r.read_u16()? as usize;
        let scod = r.read_u8()?;
        let progression_order = ProgressionOrder::from_byte(r.read_u8()?)?;
        let num_layers = r.read_u16()?;
        let use_mct = r.read_u8()? != 0;
        let num_decompositions = r.read_u8()? as u32;
        if num_decompositions > crate::constants::MAX_DECOMPOSITIONS {
            return Err(malformed!(
                24,
                "num_decompositions {num_decompositions} exceeds the supported maximum"
            ));
        }
        let log_block_w = r.read_u8()? as u32 + 2;
        let log_block_h = r.read_u8()? as u32 + 2;
        if !(crate::constants::MIN_LOG_BLOCK_DIM..=crate::constants::MAX_LOG_BLOCK_DIM)
            .contains(&log_block_w)
            || !(crate::constants::MIN_LOG_BLOCK_DIM..=crate::constants::MAX_LOG_BLOCK_DIM)
                .contains(&log_block_h)
            || log_block_w + log_block_h > crate::constants::MAX_LOG_BLOCK_AREA
        {
            return Err(malformed!(25, "code-block dimensions out of range"));
        }
        let block_style = BlockStyle::from_byte(r.read_u8()?)?;
        let wavelet = WaveletKind::from_byte(r.read_u8()?)?;
        let precinct_sizes = if scod & 1 != 0 {
            let mut sizes = Vec::with_capacity(num_decompositions as usize + 1);
            for _ in 0..=num_decompositions {
                sizes.push(r.read_u8()?);
            }
            Some(sizes)
        } else {
            None
        };
        let expected_len = 12 + if scod & 1 != 0 {
            1 + num_decompositions as usize
        } else {
            0
        };
        if lcod != expected_len {
            return Err(malformed!(26, "COD length {lcod} inconsistent with its body"));
        }
        Ok(Self {
            progression_order,
            num_layers,
            use_mct,
            num_decompositions,
            log_block_w,
            log_block_h,
            block_style,
            wavelet,
            precinct_sizes,
            sop_enabled: scod & (1 << 1) != 0,
            eph_enabled: scod & (1 << 2) != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParamCod {
        ParamCod {
            progression_order: ProgressionOrder::Cprl,
            num_layers: 1,
            use_mct: true,
            num_decompositions: 5,
            log_block_w: 6,
            log_block_h: 6,
            block_style: BlockStyle {
                vert_causal_context: false,
                ht_mixed_mode: false,
            },
            wavelet: WaveletKind::Reversible53,
            precinct_sizes: None,
            sop_enabled: false,
            eph_enabled: false,
        }
    }

    #[test]
    fn cod_round_trip_default_precincts() {
        let cod = sample();
        let mut w = MarkerWriter::new();
        cod.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert_eq!(ParamCod::read(&mut r).unwrap(), cod);
    }

    #[test]
    fn cod_round_trip_explicit_precincts() {
        let mut cod = sample();
        cod.precinct_sizes = Some(vec![0x77; 6]);
        let mut w = MarkerWriter::new();
        cod.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert_eq!(ParamCod::read(&mut r).unwrap(), cod);
    }

    #[test]
    fn cod_round_trip_sop_and_eph() {
        let mut cod = sample();
        cod.sop_enabled = true;
        cod.eph_enabled = true;
        let mut w = MarkerWriter::new();
        cod.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert_eq!(ParamCod::read(&mut r).unwrap(), cod);
    }

    #[test]
    fn rejects_non_ht_block_style() {
        let mut w = MarkerWriter::new();
        w.write_marker(COD);
        let at = w.reserve_length();
        w.write_u8(0);
        w.write_u8(0);
        w.write_u16(1);
        w.write_u8(0);
        w.write_u8(0);
        w.write_u8(4);
        w.write_u8(4);
        w.write_u8(0); // block style with HT bit unset
        w.write_u8(1);
        w.patch_length(at);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert!(ParamCod::read(&mut r).is_err());
    }
}
