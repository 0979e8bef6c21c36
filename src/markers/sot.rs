use crate::error::{malformed, CoreError};
use crate::marker_io::{MarkerReader, MarkerWriter};
use crate::markers::SOT;

/// The SOT marker segment (spec.md §4.1, §6.1): tile index, tile-part
/// payload length (Psot, inclusive of SOT itself through the end of the
/// tile-part), tile-part index and tile-part count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SotSegment {
    pub isot: u16,
    pub psot: u32,
    pub tpsot: u8,
    pub tnsot: u8,
}

impl SotSegment {
    /// Writes the fixed 10-byte SOT body with Psot reserved as zero,
    /// returning the writer offset `flush` must patch once the tile-part's
    /// total length (SOT..end of SOD payload) is known.
    pub fn write_reserving_psot(&self, w: &mut MarkerWriter) -> usize {
        w.write_marker(SOT);
        w.write_u16(10);
        w.write_u16(self.isot);
        let psot_at = w.reserve_u32();
        w.write_u8(self.tpsot);
        w.write_u8(self.tnsot);
        psot_at
    }

    pub fn read(r: &mut MarkerReader) -> Result<Self, CoreError> {
        let lsot = r.read_u16()?;
        if lsot != 10 {
            return Err(malformed!(60, "SOT length {lsot} must be 10"));
        }
        let isot = r.read_u16()?;
        let psot = r.read_u32()?;
        let tpsot = r.read_u8()?;
        let tnsot = r.read_u8()?;
        Ok(Self {
            isot,
            psot,
            tpsot,
            tnsot,
        })
    }
}
