use crate::error::{malformed, CoreError};
use crate::marker_io::{MarkerReader, MarkerWriter};
use crate::markers::{CAP, PCAP_PART15_BIT};

/// The CAP marker segment (spec.md §6.1): a capability bitmap `Pcap`
/// followed by one `Ccap` entry per set bit, in bit order. This core only
/// ever sets the Part-15 bit, so it only ever emits a single `Ccap` entry
/// (the Part-15 capability word, which HTJ2K leaves at zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamCap {
    pub pcap: u32,
    pub ccap_part15: u16,
}

impl Default for ParamCap {
    fn default() -> Self {
        Self {
            pcap: PCAP_PART15_BIT,
            ccap_part15: 0,
        }
    }
}

impl ParamCap {
    pub fn is_part15(&self) -> bool {
        self.pcap & PCAP_PART15_BIT != 0
    }

    pub fn write(&self, w: &mut MarkerWriter) {
        w.write_marker(CAP);
        let at = w.reserve_length();
        w.write_u32(self.pcap);
        w.write_u16(self.ccap_part15);
        w.patch_length(at);
    }

    pub fn read(r: &mut MarkerReader) -> Result<Self, CoreError> {
        let lcap = r.read_u16()?;
        let pcap = r.read_u32()?;
        if pcap & PCAP_PART15_BIT == 0 {
            return Err(malformed!(12, "Pcap does not set the Part-15 capability bit"));
        }
        let mut ccap_part15 = 0u16;
        // One Ccap entry per set bit of Pcap, in bit order; this core only
        // ever has the Part-15 bit set, so there is exactly one.
        let n_bits = pcap.count_ones() as usize;
        if n_bits >= 1 {
            ccap_part15 = r.read_u16()?;
        }
        for _ in 1..n_bits {
            r.read_u16()?; // skip any further Ccap entries we don't interpret
        }
        let expected_len = 2 + 4 + 2 * n_bits as u16;
        if lcap != expected_len {
            return Err(malformed!(13, "CAP length {lcap} inconsistent with Pcap"));
        }
        Ok(Self { pcap, ccap_part15 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_round_trip() {
        let cap = ParamCap::default();
        let mut w = MarkerWriter::new();
        cap.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        assert_eq!(r.read_marker().unwrap(), CAP);
        assert_eq!(ParamCap::read(&mut r).unwrap(), cap);
    }
}
