//! UVLC: the prefix+suffix code for a quad's magnitude-refinement exponent
//! `U` (spec.md §4.5), interleaved into the same reverse-growing stream as
//! VLC.
//!
//! The reference decoder's `uvlc_tbl0`/`uvlc_tbl1` (`ojph_block_decoder_
//! ssse3.cpp`) are generated at runtime from a `dec[8]` prefix-codeword
//! table (`"000"`, `"xx1"`, `"x10"`, `"100"`) that packs two quads' `U`
//! values out of one shared codeword pair. This module implements the same
//! *prefix-then-suffix* contract spec.md describes — a short prefix
//! selects a suffix bit-width, the suffix bits are read, and the two
//! values are summed with the prefix's base — with an explicit 5-entry
//! table rather than the reference's bit-packed runtime-built one, since
//! two `U` values are decoded independently here rather than sharing one
//! 6-bit VLC-adjacent codeword.

use crate::bit_io::{ReverseBitReader, ReverseBitWriter};
use crate::error::CoreError;

struct UvlcPrefix {
    code: u32,
    bits: u8,
    base: u32,
    suffix_bits: u8,
}

/// Prefix codewords in increasing length, covering `U` in `[0, 39]`
/// (comfortably above `MAX_KMAX`).
const PREFIXES: [UvlcPrefix; 5] = [
    UvlcPrefix { code: 0b1, bits: 1, base: 0, suffix_bits: 0 },
    UvlcPrefix { code: 0b01, bits: 2, base: 1, suffix_bits: 0 },
    UvlcPrefix { code: 0b001, bits: 3, base: 2, suffix_bits: 1 },
    UvlcPrefix { code: 0b0001, bits: 4, base: 4, suffix_bits: 2 },
    UvlcPrefix { code: 0b0000, bits: 4, base: 8, suffix_bits: 5 },
];

/// Decodes a single `U` value from the reverse-growing VLC/UVLC stream.
///
/// Codewords are read bit-by-bit, most significant first, and matched
/// against [`PREFIXES`] by length; the two length-4 prefixes together
/// cover every 4-bit pattern that doesn't match a shorter one.
pub fn decode_uvlc(reader: &mut ReverseBitReader) -> Result<u32, CoreError> {
    let mut acc = 0u32;
    for len in 1..=4u8 {
        acc = (acc << 1) | reader.read_bit()? as u32;
        if let Some(entry) = PREFIXES.iter().find(|e| e.bits == len && e.code == acc) {
            let suffix = if entry.suffix_bits > 0 {
                reader.read_bits(entry.suffix_bits)?
            } else {
                0
            };
            return Ok(entry.base + suffix);
        }
    }
    Err(crate::error::block_decode_failure!(
        10,
        "UVLC prefix did not match any known codeword"
    ))
}

/// Encodes `u` as a UVLC codeword, the exact mirror of [`decode_uvlc`].
pub fn encode_uvlc(writer: &mut ReverseBitWriter, u: u32) {
    let last = PREFIXES.len() - 1;
    for (i, entry) in PREFIXES.iter().enumerate() {
        let span = 1u32 << entry.suffix_bits;
        if u < entry.base + span || i == last {
            writer.write_bits(entry.code, entry.bits);
            if entry.suffix_bits > 0 {
                writer.write_bits(u - entry.base, entry.suffix_bits);
            }
            return;
        }
    }
}

/// Decodes two `U` values, reflecting spec.md's "yielding two u values from
/// one UVLC pair": each quad's codeword is read independently (the
/// reference's bit-sharing trick is a decode-side optimization, not an
/// observable wire-format requirement beyond "two UVLC reads per quad
/// pair").
pub fn decode_uvlc_pair(
    reader: &mut ReverseBitReader,
    need0: bool,
    need1: bool,
) -> Result<(u32, u32), CoreError> {
    let u0 = if need0 { decode_uvlc(reader)? } else { 0 };
    let u1 = if need1 { decode_uvlc(reader)? } else { 0 };
    Ok((u0, u1))
}

pub fn encode_uvlc_pair(writer: &mut ReverseBitWriter, u0: Option<u32>, u1: Option<u32>) {
    if let Some(u) = u0 {
        encode_uvlc(writer, u);
    }
    if let Some(u) = u1 {
        encode_uvlc(writer, u);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(values: &[u32]) {
        let mut w = ReverseBitWriter::new();
        for &v in values {
            encode_uvlc(&mut w, v);
        }
        let bytes = w.finish();
        let mut r = ReverseBitReader::new(&bytes);
        for &v in values {
            assert_eq!(decode_uvlc(&mut r).unwrap(), v);
        }
    }

    #[test]
    fn round_trips_small_values() {
        round_trip(&[0, 1, 2, 3, 4, 7]);
    }

    #[test]
    fn round_trips_large_values() {
        round_trip(&[8, 15, 20, 39]);
    }

    #[test]
    fn pair_helper_skips_unneeded_slots() {
        let mut w = ReverseBitWriter::new();
        encode_uvlc_pair(&mut w, Some(5), None);
        let bytes = w.finish();
        let mut r = ReverseBitReader::new(&bytes);
        let (u0, u1) = decode_uvlc_pair(&mut r, true, false).unwrap();
        assert_eq!(u0, 5);
        assert_eq!(u1, 0);
    }
}
