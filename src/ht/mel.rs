//! MEL: the run-length coded stream that tells the cleanup pass which
//! quads are entirely insignificant (spec.md §4.5).
//!
//! The state machine and its exponent table are taken from the reference
//! decoder's scalar `mel_decode`/`mel_init` (`examples/original_source/
//! src/core/coding/ojph_block_decoder_ssse3.cpp`), which is more precise
//! than spec.md's prose summary: reading the source shows a "1" codeword
//! encodes a run of `2^eval - 1` zero events with no terminating one (the
//! decoder must fetch another codeword afterward), while a "0" codeword
//! reads `eval` literal bits for a run of that many zero events *followed*
//! by a one event. That is the opposite pairing of bit value to outcome
//! than spec.md's own description implies; the reference source wins per
//! the resolution rule for ambiguous prose.

use crate::bit_io::{ForwardBitReader, ForwardBitWriter};
use crate::constants::MEL_STATE_COUNT;
use crate::error::CoreError;

/// Number of extra bits read per state, indexed by `k` (ojph_block_decoder_
/// ssse3.cpp's `mel_exp`).
const MEL_EXP: [u8; MEL_STATE_COUNT] = [0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 4, 5];

/// Decodes the MEL stream one cleanup-pass quad-significance event at a
/// time, matching the cardinality of quads the caller drives it with.
pub struct MelDecoder<'a> {
    reader: ForwardBitReader<'a>,
    k: u8,
    zeros_left: u32,
    terminate_pending: bool,
    have_run: bool,
}

impl<'a> MelDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ForwardBitReader::new(data),
            k: 0,
            zeros_left: 0,
            terminate_pending: false,
            have_run: false,
        }
    }

    /// Returns whether the next quad (in raster order) is significant.
    pub fn next_event(&mut self) -> Result<bool, CoreError> {
        loop {
            if !self.have_run {
                self.decode_run()?;
                self.have_run = true;
            }
            if self.zeros_left > 0 {
                self.zeros_left -= 1;
                return Ok(false);
            }
            self.have_run = false;
            if self.terminate_pending {
                return Ok(true);
            }
            // Pure zero-run with no terminator: fetch another codeword.
        }
    }

    fn decode_run(&mut self) -> Result<(), CoreError> {
        let eval = MEL_EXP[self.k as usize] as u32;
        let bit = self.reader.read_bit()?;
        if bit == 1 {
            self.zeros_left = (1u32 << eval) - 1;
            self.terminate_pending = false;
            self.k = (self.k + 1).min(12);
        } else {
            let value = if eval > 0 {
                self.reader.read_bits(eval as u8)?
            } else {
                0
            };
            self.zeros_left = value;
            self.terminate_pending = true;
            self.k = self.k.saturating_sub(1);
        }
        Ok(())
    }

    pub fn bytes_consumed(&self) -> usize {
        self.reader.bytes_consumed()
    }
}

/// Encodes a sequence of quad-significance events into the MEL stream, the
/// exact mirror of [`MelDecoder`].
pub struct MelEncoder {
    writer: ForwardBitWriter,
    k: u8,
    pending: u32,
}

impl Default for MelEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MelEncoder {
    pub fn new() -> Self {
        Self {
            writer: ForwardBitWriter::new(),
            k: 0,
            pending: 0,
        }
    }

    pub fn encode_event(&mut self, significant: bool) {
        if significant {
            let eval = MEL_EXP[self.k as usize] as u32;
            self.writer.write_bit(0);
            if eval > 0 {
                self.writer.write_bits(self.pending, eval as u8);
            }
            self.pending = 0;
            self.k = self.k.saturating_sub(1);
        } else {
            self.pending += 1;
            loop {
                let eval = MEL_EXP[self.k as usize] as u32;
                let cap = (1u32 << eval) - 1;
                if self.pending > cap {
                    self.writer.write_bit(1);
                    self.pending -= cap;
                    self.k = (self.k + 1).min(12);
                } else {
                    break;
                }
            }
        }
    }

    /// Flushes any accumulated insignificant events not followed by a
    /// significant one (a code-block may legally end mid zero-run).
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending > 0 {
            let eval = MEL_EXP[self.k as usize] as u32;
            self.writer.write_bit(0);
            if eval > 0 {
                self.writer.write_bits(self.pending, eval as u8);
            }
        }
        self.writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(events: &[bool]) {
        let mut enc = MelEncoder::new();
        for &e in events {
            enc.encode_event(e);
        }
        let bytes = enc.finish();
        let mut dec = MelDecoder::new(&bytes);
        for (i, &e) in events.iter().enumerate() {
            assert_eq!(dec.next_event().unwrap(), e, "event {i}");
        }
    }

    #[test]
    fn all_significant() {
        round_trip(&[true; 20]);
    }

    #[test]
    fn all_insignificant() {
        round_trip(&[false; 50]);
    }

    #[test]
    fn mixed_runs() {
        round_trip(&[
            false, false, false, true, false, true, true, true, false, false, false, false,
            false, false, true,
        ]);
    }

    #[test]
    fn trailing_zero_run_with_no_terminator() {
        round_trip(&[true, false, false, false, false, false, false, false, false]);
    }
}
