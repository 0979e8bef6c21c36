//! MagSgn: the forward-growing stream carrying each significant sample's
//! magnitude bits (via the quad's `U` value) and sign bit (spec.md §4.5).
//!
//! This is a thin wrapper over [`crate::bit_io::ForwardBitWriter`]/
//! [`ForwardBitReader`] adding only the MagSgn-specific bit count per
//! sample (`u_value` bits of magnitude, one trailing sign bit) and the
//! 0xFF-padding-on-exhaustion behavior spec.md calls out for this stream
//! specifically (MEL and VLC/UVLC treat exhaustion as fatal).

use crate::bit_io::{ForwardBitReader, ForwardBitWriter};
use crate::error::CoreError;

pub struct MagSgnEncoder {
    writer: ForwardBitWriter,
}

impl Default for MagSgnEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MagSgnEncoder {
    pub fn new() -> Self {
        Self {
            writer: ForwardBitWriter::new(),
        }
    }

    /// Writes one sample's magnitude (`bits` LSBs of `magnitude`) followed
    /// by its sign bit (`sign` nonzero means negative).
    pub fn write_sample(&mut self, magnitude: u32, bits: u8, sign: bool) {
        if bits > 0 {
            self.writer.write_bits(magnitude, bits);
        }
        self.writer.write_bit(sign as u8);
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.finish()
    }
}

pub struct MagSgnDecoder<'a> {
    reader: ForwardBitReader<'a>,
}

impl<'a> MagSgnDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ForwardBitReader::new(data).with_ff_padding(),
        }
    }

    /// Reads one sample's `(magnitude, sign)` given the number of magnitude
    /// bits the quad's decoded `U` value implies.
    pub fn read_sample(&mut self, bits: u8) -> Result<(u32, bool), CoreError> {
        let magnitude = if bits > 0 {
            self.reader.read_bits(bits)?
        } else {
            0
        };
        let sign = self.reader.read_bit()? != 0;
        Ok((magnitude, sign))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_several_samples() {
        let samples = [(0u32, 3u8, false), (5, 3, true), (127, 7, false), (0, 0, true)];
        let mut enc = MagSgnEncoder::new();
        for &(mag, bits, sign) in &samples {
            enc.write_sample(mag, bits, sign);
        }
        let bytes = enc.finish();
        let mut dec = MagSgnDecoder::new(&bytes);
        for &(mag, bits, sign) in &samples {
            let (m, s) = dec.read_sample(bits).unwrap();
            assert_eq!(m, mag);
            assert_eq!(s, sign);
        }
    }

    #[test]
    fn pads_with_ff_on_exhaustion() {
        let bytes: Vec<u8> = vec![0x00];
        let mut dec = MagSgnDecoder::new(&bytes);
        let _ = dec.read_sample(8).unwrap();
        // Exhausted: further reads must not error, per spec.md's MagSgn
        // padding rule.
        assert!(dec.read_sample(8).is_ok());
    }
}
