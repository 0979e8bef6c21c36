use crate::error::{malformed, CoreError};
use crate::marker_io::{MarkerReader, MarkerWriter};
use crate::markers::TLM;

/// One (tile index, tile-part length) pair within a TLM segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLengthPair {
    pub tile_index: u16,
    pub tile_part_length: u32,
}

/// The TLM marker segment (spec.md §4.1, §6.1). `read_headers` ignores TLM
/// on decode (spec.md says so explicitly); it is parsed here anyway so the
/// example driver and tests can inspect it, and so `flush` can round-trip
/// what it wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlmSegment {
    pub ztlm: u8,
    pub pairs: Vec<TileLengthPair>,
}

impl TlmSegment {
    pub fn new(pairs: Vec<TileLengthPair>) -> Self {
        Self { ztlm: 0, pairs }
    }

    /// Stlm: ST=1 (16-bit tile index), SP=1 (32-bit tile-part length) —
    /// the only combination this core emits, chosen so TLM never needs to
    /// be re-derived for larger images.
    const STLM: u8 = (1 << 4) | (1 << 6);

    pub fn write(&self, w: &mut MarkerWriter) {
        w.write_marker(TLM);
        let at = w.reserve_length();
        w.write_u8(self.ztlm);
        w.write_u8(Self::STLM);
        for p in &self.pairs {
            w.write_u16(p.tile_index);
            w.write_u32(p.tile_part_length);
        }
        w.patch_length(at);
    }

    pub fn read(r: &mut MarkerReader) -> Result<Self, CoreError> {
        let ltlm = r.read_u16()? as usize;
        let ztlm = r.read_u8()?;
        let stlm = r.read_u8()?;
        if stlm != Self::STLM {
            return Err(malformed!(
                50,
                "unsupported Stlm encoding {stlm:#x} (only 16-bit tile / 32-bit length is read)"
            ));
        }
        let body = ltlm.checked_sub(4).ok_or_else(|| malformed!(51, "TLM length too short"))?;
        if body % 6 != 0 {
            return Err(malformed!(52, "TLM body length {body} not a multiple of 6"));
        }
        let mut pairs = Vec::with_capacity(body / 6);
        for _ in 0..(body / 6) {
            let tile_index = r.read_u16()?;
            let tile_part_length = r.read_u32()?;
            pairs.push(TileLengthPair {
                tile_index,
                tile_part_length,
            });
        }
        Ok(Self { ztlm, pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tlm_round_trip() {
        let tlm = TlmSegment::new(vec![
            TileLengthPair {
                tile_index: 0,
                tile_part_length: 1024,
            },
            TileLengthPair {
                tile_index: 1,
                tile_part_length: 2048,
            },
        ]);
        let mut w = MarkerWriter::new();
        tlm.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert_eq!(TlmSegment::read(&mut r).unwrap(), tlm);
    }
}
