//! Bit-level readers/writers implementing the three cooperating bit-stuffing
//! disciplines used by the HT block coder and packet headers (spec.md §4.5,
//! §4.6):
//!
//! - Forward-growing, stuff-after-0xFF (MagSgn, packet headers): after any
//!   byte equal to 0xFF is emitted, the following byte's MSB carries no
//!   information and is forced to 0 on encode / skipped on decode.
//! - MEL unstuffing is the same rule (spec.md calls out "uses the next
//!   byte's 7 LSBs only", which is exactly the 7 bits below the forced MSB).
//! - Reverse-growing, stuff-above-0x8F (VLC+UVLC): bytes are emitted from
//!   the end of the code-block buffer backward; the stuffing condition
//!   triggers when the byte nearer the end of the buffer (i.e. emitted just
//!   before, in construction order) has value > 0x8F.
//!
//! Bits are packed MSB-first within each byte in both directions.

use crate::error::{block_decode_failure, CoreError};

/// Forward-growing bit writer with the MagSgn/packet-header stuffing rule.
pub struct ForwardBitWriter {
    data: Vec<u8>,
    cur: u8,
    nbits: u8,
}

impl Default for ForwardBitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ForwardBitWriter {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            cur: 0,
            nbits: 0,
        }
    }

    pub fn write_bit(&mut self, bit: u8) {
        self.cur = (self.cur << 1) | (bit & 1);
        self.nbits += 1;
        if self.nbits == 8 {
            self.flush_byte();
        }
    }

    pub fn write_bits(&mut self, value: u32, count: u8) {
        for i in (0..count).rev() {
            self.write_bit(((value >> i) & 1) as u8);
        }
    }

    fn flush_byte(&mut self) {
        self.data.push(self.cur);
        let stuffed = self.cur == 0xFF;
        self.cur = 0;
        // If the byte just emitted was 0xFF, the next byte's MSB is a
        // reserved zero stuffing bit: pre-seed one bit of zero value.
        self.nbits = if stuffed { 1 } else { 0 };
    }

    pub fn bit_len(&self) -> usize {
        self.data.len() * 8 + self.nbits as usize
    }

    /// Flushes any partial byte (zero-padded) and returns the stream.
    pub fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.cur <<= 8 - self.nbits;
            self.data.push(self.cur);
        }
        self.data
    }
}

/// Forward-growing bit reader mirroring `ForwardBitWriter`.
pub struct ForwardBitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bitbuf: u8,
    bits_left: u8,
    prev_was_ff: bool,
    pad_with_ff: bool,
}

impl<'a> ForwardBitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bitbuf: 0,
            bits_left: 0,
            prev_was_ff: false,
            pad_with_ff: false,
        }
    }

    /// MagSgn specifically pads with 0xFF bytes once the segment is
    /// exhausted (spec.md §4.5: "On exhaustion the decoder feeds 0xFF
    /// padding"). MEL and packet-header readers do not: exhaustion there is
    /// a hard failure.
    pub fn with_ff_padding(mut self) -> Self {
        self.pad_with_ff = true;
        self
    }

    pub fn read_bit(&mut self) -> Result<u8, CoreError> {
        if self.bits_left == 0 {
            let b = if self.pos < self.data.len() {
                let b = self.data[self.pos];
                self.pos += 1;
                b
            } else if self.pad_with_ff {
                0xFF
            } else {
                return Err(block_decode_failure!(
                    1,
                    "bitstream exhausted during mandatory read"
                ));
            };
            self.bitbuf = b;
            self.bits_left = if self.prev_was_ff { 7 } else { 8 };
            self.prev_was_ff = b == 0xFF;
        }
        let shift = self.bits_left - 1;
        let bit = (self.bitbuf >> shift) & 1;
        self.bits_left -= 1;
        Ok(bit)
    }

    pub fn read_bits(&mut self, count: u8) -> Result<u32, CoreError> {
        let mut v = 0u32;
        for _ in 0..count {
            v = (v << 1) | self.read_bit()? as u32;
        }
        Ok(v)
    }

    pub fn bytes_consumed(&self) -> usize {
        self.pos
    }
}

/// Reverse-growing bit writer with the VLC/UVLC stuffing rule (stuff above
/// 0x8F). Bits are accumulated in emission order (first bit emitted ends up
/// nearest the end of the code-block buffer); `finish` reverses the byte
/// order to produce the buffer-order bytes to splice in before the end of
/// the block.
pub struct ReverseBitWriter {
    bytes: Vec<u8>,
    cur: u8,
    nbits: u8,
}

impl Default for ReverseBitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverseBitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            cur: 0,
            nbits: 0,
        }
    }

    pub fn write_bit(&mut self, bit: u8) {
        self.cur = (self.cur << 1) | (bit & 1);
        self.nbits += 1;
        if self.nbits == 8 {
            self.flush_byte();
        }
    }

    pub fn write_bits(&mut self, value: u32, count: u8) {
        for i in (0..count).rev() {
            self.write_bit(((value >> i) & 1) as u8);
        }
    }

    fn flush_byte(&mut self) {
        self.bytes.push(self.cur);
        let stuffed = self.cur > 0x8F;
        self.cur = 0;
        self.nbits = if stuffed { 1 } else { 0 };
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.nbits as usize
    }

    /// Finishes the segment, returning bytes in normal (low-to-high address)
    /// stream order, ready to be placed just before the block's trailing
    /// Scup/half-byte marker.
    pub fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.cur <<= 8 - self.nbits;
            self.bytes.push(self.cur);
        }
        self.bytes.reverse();
        self.bytes
    }
}

/// Reverse bit reader over a byte slice, consuming from the end backward.
pub struct ReverseBitReader<'a> {
    data: &'a [u8],
    pos: usize, // index one-past the next byte to consume
    bitbuf: u8,
    bits_left: u8,
    prev_over_threshold: bool,
}

impl<'a> ReverseBitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: data.len(),
            bitbuf: 0,
            bits_left: 0,
            prev_over_threshold: false,
        }
    }

    pub fn read_bit(&mut self) -> Result<u8, CoreError> {
        if self.bits_left == 0 {
            if self.pos == 0 {
                return Err(block_decode_failure!(
                    2,
                    "VLC/UVLC bitstream exhausted during mandatory read"
                ));
            }
            self.pos -= 1;
            let b = self.data[self.pos];
            self.bitbuf = b;
            self.bits_left = if self.prev_over_threshold { 7 } else { 8 };
            self.prev_over_threshold = b > 0x8F;
        }
        let shift = self.bits_left - 1;
        let bit = (self.bitbuf >> shift) & 1;
        self.bits_left -= 1;
        Ok(bit)
    }

    pub fn read_bits(&mut self, count: u8) -> Result<u32, CoreError> {
        let mut v = 0u32;
        for _ in 0..count {
            v = (v << 1) | self.read_bit()? as u32;
        }
        Ok(v)
    }
}
