use crate::error::{malformed, CoreError};
use crate::marker_io::{MarkerReader, MarkerWriter};
use crate::markers::COM;

/// The COM marker segment: an `Rcom` registration value followed by free
/// text (spec.md §6.1). `write_headers` emits exactly one, carrying a short
/// identification string; `read_headers` ignores any it encounters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCom {
    pub rcom: u16,
    pub text: Vec<u8>,
}

impl ParamCom {
    pub const RCOM_LATIN: u16 = 1;

    pub fn identification(text: &str) -> Self {
        Self {
            rcom: Self::RCOM_LATIN,
            text: text.as_bytes().to_vec(),
        }
    }

    pub fn write(&self, w: &mut MarkerWriter) {
        w.write_marker(COM);
        let at = w.reserve_length();
        w.write_u16(self.rcom);
        w.write_bytes(&self.text);
        w.patch_length(at);
    }

    pub fn read(r: &mut MarkerReader) -> Result<Self, CoreError> {
        let lcom = r.read_u16()? as usize;
        if lcom < 4 {
            return Err(malformed!(40, "COM length {lcom} too short to hold Rcom"));
        }
        let rcom = r.read_u16()?;
        let text = r.take(lcom - 4)?.to_vec();
        Ok(Self { rcom, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn com_round_trip() {
        let com = ParamCom::identification("htj2k-rs");
        let mut w = MarkerWriter::new();
        com.write(&mut w);
        let bytes = w.into_inner();
        let mut r = MarkerReader::new(&bytes);
        r.read_marker().unwrap();
        assert_eq!(ParamCom::read(&mut r).unwrap(), com);
    }
}
