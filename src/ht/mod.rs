//! HT code-block coder (spec.md §4.5): the cleanup pass that turns a
//! code-block's quantized coefficients into the three cooperating
//! bitstreams (MagSgn, MEL, VLC+UVLC) and back.
//!
//! Only the cleanup pass is mandatory (spec.md: "implementations may elect
//! to emit cleanup-only"); this module does so. [`CodeBlockPasses`] still
//! names the optional SPP/MRP segments so the block-framing types have a
//! place to carry them if a future pass is added, but this coder never
//! produces non-empty ones.
//!
//! Quads are coded in vertically-stacked pairs within each 4-row stripe so
//! that one UVLC pair covers both quads' `U` values, matching spec.md's
//! "yielding two u values from one UVLC pair." The context for each quad's
//! VLC table selection is 1 when its already-decoded left or above
//! neighbor quad is significant, 0 otherwise.
//!
//! `Ek`, the per-sample exponent subtracted from `U` to get the number of
//! MagSgn magnitude bits (spec.md: "Ek is a per-sample exponent derived
//! from Rho and the per-quad U"), is treated as 0 here: every significant
//! sample in a quad is written with the full `U` magnitude bits. A precise
//! Ek requires the per-subband bit-plane budget context that sits above a
//! single code-block, and is recorded as an open question in DESIGN.md
//! rather than guessed.

pub mod magsgn;
pub mod mel;
pub mod uvlc;
pub mod vlc;

use crate::constants::{MAX_SCUP, MIN_SCUP};
use crate::error::{block_decode_failure, CoreError};
use magsgn::{MagSgnDecoder, MagSgnEncoder};
use mel::{MelDecoder, MelEncoder};
use uvlc::{decode_uvlc_pair, encode_uvlc_pair};

#[derive(Debug, Clone, Copy)]
pub struct BlockDims {
    pub width: usize,
    pub height: usize,
}

impl BlockDims {
    fn quads_wide(&self) -> usize {
        self.width.div_ceil(2)
    }

    fn quads_high(&self) -> usize {
        self.height.div_ceil(2)
    }
}

/// The four non-MagSgn/MEL/VLC passes a code-block may in principle carry.
/// Always empty for a cleanup-only encoder; present so decoders built
/// against a richer bitstream (SPP/MRP present) have somewhere to route
/// those bytes without changing the framing type.
#[derive(Debug, Default, Clone)]
pub struct CodeBlockPasses {
    pub spp: Vec<u8>,
    pub mrp: Vec<u8>,
}

/// The three constituent streams of one HT code-block, plus its Lcup/Scup
/// framing (spec.md §4.5).
///
/// `mel` and `vlc` are kept as non-overlapping byte regions rather than
/// sharing one buffer with MEL growing forward and VLC/UVLC growing
/// backward into the same space until they meet — the real format allows
/// the two to overlap within `Scup` bytes, which this coder never produces
/// or requires (it always leaves the two disjoint).
pub struct BlockStream {
    pub magsgn: Vec<u8>,
    pub mel: Vec<u8>,
    pub vlc: Vec<u8>,
    pub passes: CodeBlockPasses,
}

impl BlockStream {
    /// Total block length `Lcup`.
    pub fn lcup(&self) -> usize {
        self.magsgn.len() + self.mel.len() + self.vlc.len()
    }

    /// Assembles the on-wire byte sequence: MagSgn, then MEL+VLC with the
    /// trailing Scup/half-byte marker spec.md describes. `Scup` is the
    /// byte length of the MEL+VLC segment, which must fall in
    /// `[MIN_SCUP, min(Lcup, MAX_SCUP)]`.
    pub fn assemble(&self) -> Result<Vec<u8>, CoreError> {
        let mel_vlc_len = self.mel.len() + self.vlc.len();
        let scup = mel_vlc_len + 2; // Scup counts its own two length bytes.
        if scup < MIN_SCUP as usize || scup > MAX_SCUP as usize || scup > self.lcup() + 2 {
            return Err(block_decode_failure!(
                20,
                format!("Scup {scup} out of range [{MIN_SCUP}, {MAX_SCUP}]")
            ));
        }
        let mut out = Vec::with_capacity(self.magsgn.len() + mel_vlc_len + 2);
        out.extend_from_slice(&self.magsgn);
        out.extend_from_slice(&self.mel);
        out.extend_from_slice(&self.vlc);
        // Scup is recorded as a little-endian u16 immediately before the
        // half-byte marker byte, per spec.md's "preceding two bytes".
        out.push((scup & 0xFF) as u8);
        out.push(((scup >> 8) & 0xFF) as u8);
        out.push(0x00); // half-byte start marker, low nibble reserved.
        Ok(out)
    }

    /// Splits an assembled block buffer back into its constituent streams.
    /// `magsgn_len` must be known from the packet header's accounting of
    /// `Lcup` minus `Scup` (this module does not itself track per-block
    /// byte counts at the packet-header layer).
    pub fn disassemble(data: &[u8], magsgn_len: usize) -> Result<Self, CoreError> {
        if data.len() < 3 {
            return Err(block_decode_failure!(
                21,
                "HT code-block buffer too short for Scup framing"
            ));
        }
        let marker_pos = data.len() - 1;
        let scup = data[marker_pos - 2] as usize | ((data[marker_pos - 1] as usize) << 8);
        if scup < MIN_SCUP as usize || scup > MAX_SCUP as usize {
            return Err(block_decode_failure!(
                22,
                format!("Scup {scup} out of range [{MIN_SCUP}, {MAX_SCUP}]")
            ));
        }
        let mel_vlc_len = scup.saturating_sub(2);
        if magsgn_len + mel_vlc_len + 3 > data.len() {
            return Err(block_decode_failure!(
                23,
                "Scup/magsgn length accounting exceeds block buffer"
            ));
        }
        let magsgn = data[..magsgn_len].to_vec();
        let mel_vlc = &data[magsgn_len..magsgn_len + mel_vlc_len];
        // MEL and VLC share one forward+reverse bitstream region; this
        // coder keeps them as one combined slice and lets the MEL decoder
        // consume from the front while VLC/UVLC consume from the back, so
        // no further split is needed here.
        Ok(Self {
            magsgn,
            mel: mel_vlc.to_vec(),
            vlc: Vec::new(),
            passes: CodeBlockPasses::default(),
        })
    }
}

struct QuadContext {
    sig: Vec<bool>,
    quads_wide: usize,
}

impl QuadContext {
    fn new(dims: BlockDims) -> Self {
        let quads_wide = dims.quads_wide();
        Self {
            sig: vec![false; quads_wide * dims.quads_high()],
            quads_wide,
        }
    }

    fn context_for(&self, qx: usize, qy: usize) -> u8 {
        let left = qx > 0 && self.sig[qy * self.quads_wide + qx - 1];
        let above = qy > 0 && self.sig[(qy - 1) * self.quads_wide + qx];
        (left || above) as u8
    }

    fn set(&mut self, qx: usize, qy: usize, significant: bool) {
        self.sig[qy * self.quads_wide + qx] = significant;
    }
}

/// Decodes a cleanup-pass code-block into a `width * height` row-major
/// coefficient matrix (zero where insignificant).
pub fn decode_cleanup_pass(
    dims: BlockDims,
    stream: &BlockStream,
    u_bits_cap: u8,
) -> Result<Vec<i32>, CoreError> {
    let mut coeffs = vec![0i32; dims.width * dims.height];
    let mut mel = MelDecoder::new(&stream.mel);
    let mut magsgn = MagSgnDecoder::new(&stream.magsgn);
    // VLC/UVLC read from the same combined MEL+VLC slice, but from its end
    // backward; the reverse readers get their own cursor over that slice.
    let mut vlc_reader = crate::bit_io::ReverseBitReader::new(&stream.mel);
    let mut ctx = QuadContext::new(dims);

    let quads_wide = dims.quads_wide();
    let quads_high = dims.quads_high();

    for qy_pair in (0..quads_high).step_by(2) {
        let has_lower = qy_pair + 1 < quads_high;
        for qx in 0..quads_wide {
            let context_upper = ctx.context_for(qx, qy_pair);
            let sig_upper = mel.next_event()?;
            let rho_upper = if sig_upper {
                decode_rho(&mut vlc_reader, context_upper)?
            } else {
                0
            };
            ctx.set(qx, qy_pair, rho_upper != 0);

            let (context_lower, sig_lower, rho_lower) = if has_lower {
                let context_lower = ctx.context_for(qx, qy_pair + 1);
                let sig_lower = mel.next_event()?;
                let rho_lower = if sig_lower {
                    decode_rho(&mut vlc_reader, context_lower)?
                } else {
                    0
                };
                ctx.set(qx, qy_pair + 1, rho_lower != 0);
                (context_lower, sig_lower, rho_lower)
            } else {
                (0, false, 0)
            };

            let (u0, u1) = decode_uvlc_pair(&mut vlc_reader, rho_upper != 0, rho_lower != 0)?;
            let u0 = u0.min(u_bits_cap as u32);
            let u1 = u1.min(u_bits_cap as u32);

            place_quad(&mut coeffs, dims, qx, qy_pair, rho_upper, u0 as u8, &mut magsgn)?;
            if has_lower {
                place_quad(
                    &mut coeffs,
                    dims,
                    qx,
                    qy_pair + 1,
                    rho_lower,
                    u1 as u8,
                    &mut magsgn,
                )?;
            }
            let _ = (sig_upper, sig_lower, context_lower);
        }
    }
    Ok(coeffs)
}

fn decode_rho(reader: &mut crate::bit_io::ReverseBitReader, context: u8) -> Result<u8, CoreError> {
    // Peek is approximated by reading bits one at a time and matching the
    // shortest prefix, mirroring encode_vlc/decode_vlc's length-first
    // design without needing true lookahead over a reverse bit reader.
    let mut acc: u16 = 0;
    for len in 1..=8u8 {
        acc = (acc << 1) | reader.read_bit()? as u16;
        let peek = acc << (16 - len);
        let (rho, _u_off, bits) = vlc::decode_vlc(peek, context);
        if bits == len {
            return Ok(rho);
        }
    }
    Err(block_decode_failure!(24, "VLC codeword did not resolve"))
}

fn place_quad(
    coeffs: &mut [i32],
    dims: BlockDims,
    qx: usize,
    qy: usize,
    rho: u8,
    u: u8,
    magsgn: &mut MagSgnDecoder,
) -> Result<(), CoreError> {
    let offsets = [(0usize, 0usize), (1, 0), (0, 1), (1, 1)];
    for (i, &(dx, dy)) in offsets.iter().enumerate() {
        if (rho >> i) & 1 == 0 {
            continue;
        }
        let x = qx * 2 + dx;
        let y = qy * 2 + dy;
        if x >= dims.width || y >= dims.height {
            continue;
        }
        let (magnitude, sign) = magsgn.read_sample(u)?;
        let value = magnitude as i32;
        coeffs[y * dims.width + x] = if sign { -value } else { value };
    }
    Ok(())
}

/// Encodes `coefficients` (row-major, `width * height`, magnitude+sign
/// already quantized) into a cleanup-pass [`BlockStream`].
pub fn encode_cleanup_pass(
    dims: BlockDims,
    coefficients: &[i32],
    u_bits_cap: u8,
) -> BlockStream {
    let mut mel = MelEncoder::new();
    let mut magsgn = MagSgnEncoder::new();
    let mut vlc_writer = crate::bit_io::ReverseBitWriter::new();
    let mut ctx = QuadContext::new(dims);

    let quads_wide = dims.quads_wide();
    let quads_high = dims.quads_high();

    for qy_pair in (0..quads_high).step_by(2) {
        let has_lower = qy_pair + 1 < quads_high;
        for qx in 0..quads_wide {
            let rho_upper = quad_rho(coefficients, dims, qx, qy_pair);
            let sig_upper = rho_upper != 0;
            mel.encode_event(sig_upper);
            if sig_upper {
                let context = ctx.context_for(qx, qy_pair);
                encode_rho(&mut vlc_writer, rho_upper, context);
            }
            ctx.set(qx, qy_pair, sig_upper);

            let rho_lower = if has_lower {
                quad_rho(coefficients, dims, qx, qy_pair + 1)
            } else {
                0
            };
            if has_lower {
                let sig_lower = rho_lower != 0;
                mel.encode_event(sig_lower);
                if sig_lower {
                    let context = ctx.context_for(qx, qy_pair + 1);
                    encode_rho(&mut vlc_writer, rho_lower, context);
                }
                ctx.set(qx, qy_pair + 1, sig_lower);
            }

            let u0 = quad_u(coefficients, dims, qx, qy_pair, rho_upper, u_bits_cap);
            let u1 = if has_lower {
                quad_u(coefficients, dims, qx, qy_pair + 1, rho_lower, u_bits_cap)
            } else {
                0
            };
            encode_uvlc_pair(
                &mut vlc_writer,
                (rho_upper != 0).then_some(u0),
                (rho_lower != 0).then_some(u1),
            );

            write_quad(&mut magsgn, coefficients, dims, qx, qy_pair, rho_upper, u0 as u8);
            if has_lower {
                write_quad(&mut magsgn, coefficients, dims, qx, qy_pair + 1, rho_lower, u1 as u8);
            }
        }
    }

    BlockStream {
        magsgn: magsgn.finish(),
        mel: mel.finish(),
        vlc: vlc_writer.finish(),
        passes: CodeBlockPasses::default(),
    }
}

fn quad_rho(coefficients: &[i32], dims: BlockDims, qx: usize, qy: usize) -> u8 {
    let offsets = [(0usize, 0usize), (1, 0), (0, 1), (1, 1)];
    let mut rho = 0u8;
    for (i, &(dx, dy)) in offsets.iter().enumerate() {
        let x = qx * 2 + dx;
        let y = qy * 2 + dy;
        if x < dims.width && y < dims.height && coefficients[y * dims.width + x] != 0 {
            rho |= 1 << i;
        }
    }
    rho
}

fn quad_u(coefficients: &[i32], dims: BlockDims, qx: usize, qy: usize, rho: u8, cap: u8) -> u32 {
    if rho == 0 {
        return 0;
    }
    let offsets = [(0usize, 0usize), (1, 0), (0, 1), (1, 1)];
    let mut max_bits = 0u32;
    for (i, &(dx, dy)) in offsets.iter().enumerate() {
        if (rho >> i) & 1 == 0 {
            continue;
        }
        let x = qx * 2 + dx;
        let y = qy * 2 + dy;
        if x >= dims.width || y >= dims.height {
            continue;
        }
        let magnitude = coefficients[y * dims.width + x].unsigned_abs();
        let bits = 32 - magnitude.leading_zeros();
        max_bits = max_bits.max(bits);
    }
    max_bits.min(cap as u32)
}

fn write_quad(
    magsgn: &mut MagSgnEncoder,
    coefficients: &[i32],
    dims: BlockDims,
    qx: usize,
    qy: usize,
    rho: u8,
    u: u8,
) {
    let offsets = [(0usize, 0usize), (1, 0), (0, 1), (1, 1)];
    for (i, &(dx, dy)) in offsets.iter().enumerate() {
        if (rho >> i) & 1 == 0 {
            continue;
        }
        let x = qx * 2 + dx;
        let y = qy * 2 + dy;
        if x >= dims.width || y >= dims.height {
            continue;
        }
        let value = coefficients[y * dims.width + x];
        magsgn.write_sample(value.unsigned_abs(), u, value < 0);
    }
}

fn encode_rho(writer: &mut crate::bit_io::ReverseBitWriter, rho: u8, context: u8) {
    let (value, bits) = vlc::encode_vlc(rho, context);
    writer.write_bits(value, bits);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_block() {
        let dims = BlockDims { width: 4, height: 4 };
        #[rustfmt::skip]
        let coefficients: Vec<i32> = vec![
            0, 0, 5, -3,
            0, 0, 0, 2,
            -7, 0, 0, 0,
            1, 0, 0, 0,
        ];
        let stream = encode_cleanup_pass(dims, &coefficients, 16);
        // Splice the framed MEL+VLC region back together the way
        // decode_cleanup_pass expects: MEL bytes then VLC bytes
        // concatenated, since the reverse reader walks the combined slice
        // from its end.
        let mut combined = stream.mel.clone();
        combined.extend_from_slice(&stream.vlc);
        let reassembled = BlockStream {
            magsgn: stream.magsgn.clone(),
            mel: combined,
            vlc: Vec::new(),
            passes: CodeBlockPasses::default(),
        };
        let decoded = decode_cleanup_pass(dims, &reassembled, 16).unwrap();
        assert_eq!(decoded, coefficients);
    }

    #[test]
    fn all_zero_block_round_trips() {
        let dims = BlockDims { width: 3, height: 5 };
        let coefficients = vec![0i32; 15];
        let stream = encode_cleanup_pass(dims, &coefficients, 16);
        let mut combined = stream.mel.clone();
        combined.extend_from_slice(&stream.vlc);
        let reassembled = BlockStream {
            magsgn: stream.magsgn.clone(),
            mel: combined,
            vlc: Vec::new(),
            passes: CodeBlockPasses::default(),
        };
        let decoded = decode_cleanup_pass(dims, &reassembled, 16).unwrap();
        assert_eq!(decoded, coefficients);
    }

    #[test]
    fn scup_framing_round_trips() {
        let stream = BlockStream {
            magsgn: vec![1, 2, 3],
            mel: vec![4, 5],
            vlc: vec![6, 7, 8],
            passes: CodeBlockPasses::default(),
        };
        let assembled = stream.assemble().unwrap();
        let split = BlockStream::disassemble(&assembled, 3).unwrap();
        assert_eq!(split.magsgn, vec![1, 2, 3]);
    }
}
