//! Precinct packet header coding (spec.md §4.6): per-subband inclusion and
//! zero-bitplane tag trees, code-block length coding, and the packet
//! zero-length flag.
//!
//! This coder always signals exactly one coding pass per newly-included
//! code-block (a cleanup-only pass, per [`crate::ht`]), which is the fixed
//! case spec.md §4.6's number-of-passes table gives explicitly: "1 →
//! '0'". Only that one codeword is ever written or read; the table's
//! longer codewords for 2+ passes (`"10"`, `"1100"`, `"1101x"`, `"1111xxxx
//! xxxxx"`) are never needed by a cleanup-only coder and are not
//! implemented, a limitation recorded in DESIGN.md's Open Questions.
//!
//! Code-block length coding follows Part 1 §B.10.7: each code-block tracks
//! a running `Lblock` (initially 3), incremented before each inclusion by
//! a unary-coded amount (`k` one-bits then a terminating zero means `+k`),
//! and the packet body then carries `Lblock + floor(log2(num_passes))`
//! bits of actual byte length.

use crate::bit_io::{ForwardBitReader, ForwardBitWriter};
use crate::codeblock::CodeBlock;
use crate::error::{block_decode_failure, CoreError};
use crate::tag_tree::TagTree;

const INITIAL_LBLOCK: u32 = 3;

/// Per-subband packet-header state, persistent across layers within one
/// precinct (tag trees and `Lblock` running values accumulate knowledge
/// layer over layer, per spec.md's progressive tag-tree semantics).
pub struct SubbandPacketState {
    pub blocks_wide: usize,
    pub blocks_high: usize,
    inclusion: TagTree,
    zero_bitplane: TagTree,
    lblock: Vec<u32>,
}

impl SubbandPacketState {
    /// `first_included_layers[i]` is the layer index at which code-block
    /// `i` (row-major) first becomes part of a packet, and
    /// `zero_bit_planes[i]` its all-zero MSB-plane count; both must be
    /// known up front since the encoder already has the fully coded
    /// representation before any packet header is written.
    pub fn new_for_encoding(
        blocks_wide: usize,
        blocks_high: usize,
        first_included_layers: &[i32],
        zero_bit_planes: &[i32],
    ) -> Self {
        Self {
            blocks_wide,
            blocks_high,
            inclusion: TagTree::new_for_encoding(blocks_wide, blocks_high, first_included_layers),
            zero_bitplane: TagTree::new_for_encoding(blocks_wide, blocks_high, zero_bit_planes),
            lblock: vec![INITIAL_LBLOCK; blocks_wide * blocks_high],
        }
    }

    pub fn new_for_decoding(blocks_wide: usize, blocks_high: usize) -> Self {
        Self {
            blocks_wide,
            blocks_high,
            inclusion: TagTree::new_for_decoding(blocks_wide, blocks_high),
            zero_bitplane: TagTree::new_for_decoding(blocks_wide, blocks_high),
            lblock: vec![INITIAL_LBLOCK; blocks_wide * blocks_high],
        }
    }

    fn idx(&self, bx: usize, by: usize) -> usize {
        by * self.blocks_wide + bx
    }
}

fn write_unary_increment(writer: &mut ForwardBitWriter, increment: u32) {
    for _ in 0..increment {
        writer.write_bit(1);
    }
    writer.write_bit(0);
}

fn read_unary_increment(reader: &mut ForwardBitReader) -> Result<u32, CoreError> {
    let mut n = 0u32;
    while reader.read_bit()? == 1 {
        n += 1;
    }
    Ok(n)
}

/// Number of bits needed to hold `n` as an unsigned value (0 for `n == 0`).
fn bits_to_represent(n: u32) -> u32 {
    u32::BITS - n.leading_zeros()
}

/// Encodes one code-block's packet-header contribution for `layer` into
/// `writer`. Returns `true` if the block is included in this packet (and
/// its length field + coded bytes must follow in the body).
pub fn encode_block_header(
    state: &mut SubbandPacketState,
    bx: usize,
    by: usize,
    layer: u32,
    block: &mut CodeBlock,
    writer: &mut ForwardBitWriter,
) -> bool {
    let already_included = block.included;
    if already_included {
        // A code-block carries exactly one (cleanup) pass in this coder,
        // contributed at its first inclusion layer only, so every later
        // layer's continuation bit is always 0 (no new passes).
        writer.write_bit(0);
        return false;
    }

    // Drive the inclusion tag tree with this block's true first-included
    // layer as the threshold ceiling: encode_leaf signals "included" the
    // first time low reaches that true value.
    let true_layer = block.first_included_layer.unwrap_or(layer) as i32;
    state.inclusion.encode_leaf(bx, by, (layer as i32) + 1, writer);
    if true_layer as u32 != layer {
        return false;
    }

    block.mark_included(layer);
    state
        .zero_bitplane
        .encode_leaf(bx, by, block.zero_bit_planes as i32 + 1, writer);

    // Cleanup-only: exactly one coding pass is ever included, signaled the
    // first (and only) time a block becomes included, using spec.md
    // §4.6's literal codeword for that case ("1 -> '0'").
    writer.write_bit(0);

    let idx = state.idx(bx, by);
    let needed_lblock = bits_to_represent(block.coded_data.len() as u32).max(1);
    let increment = needed_lblock.saturating_sub(state.lblock[idx]);
    write_unary_increment(writer, increment);
    state.lblock[idx] += increment;
    writer.write_bits(block.coded_data.len() as u32, state.lblock[idx] as u8);
    true
}

/// Decodes one code-block's packet-header contribution for `layer`.
/// Returns `Some(byte_length)` if the block is included in this packet.
pub fn decode_block_header(
    state: &mut SubbandPacketState,
    bx: usize,
    by: usize,
    layer: u32,
    block: &mut CodeBlock,
    reader: &mut ForwardBitReader,
) -> Result<Option<usize>, CoreError> {
    if block.included {
        // Already included in an earlier layer: the continuation bit is
        // always 0 in this single-pass coder (see encode_block_header).
        let continuation = reader.read_bit()?;
        if continuation != 0 {
            return Err(block_decode_failure!(
                42,
                "unexpected continuation bit for an already-included code-block"
            ));
        }
        return Ok(None);
    }

    let revealed = state
        .inclusion
        .decode_leaf(bx, by, layer as i32 + 1, reader)?;
    let newly_included = matches!(revealed, Some(first_layer) if first_layer as u32 == layer);
    if !newly_included {
        return Ok(None);
    }

    block.mark_included(layer);
    let zbp = state
        .zero_bitplane
        .decode_leaf(bx, by, i32::MAX, reader)?
        .ok_or_else(|| block_decode_failure!(40, "zero-bitplane tag tree did not resolve"))?;
    block.zero_bit_planes = zbp.max(0) as u8;

    if reader.read_bit()? != 0 {
        return Err(block_decode_failure!(
            41,
            "expected the 1-pass codeword '0' from spec.md's number-of-passes table"
        ));
    }

    let idx = state.idx(bx, by);
    let increment = read_unary_increment(reader)?;
    state.lblock[idx] += increment;
    let length = reader.read_bits(state.lblock[idx] as u8)? as usize;
    Ok(Some(length))
}

/// Writes the packet's zero-length flag: `false` means the packet is empty
/// (no code-blocks included in this layer at this precinct) and no further
/// header bits follow.
pub fn write_packet_presence(writer: &mut ForwardBitWriter, non_empty: bool) {
    writer.write_bit(non_empty as u8);
}

pub fn read_packet_presence(reader: &mut ForwardBitReader) -> Result<bool, CoreError> {
    Ok(reader.read_bit()? == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn single_block_included_at_expected_layer() {
        let mut enc_block = CodeBlock::new(Rect::from_corners(0, 0, 64, 64));
        enc_block.coded_data = vec![0u8; 100];
        let mut enc_state = SubbandPacketState::new_for_encoding(1, 1, &[1], &[0]);
        let mut w = ForwardBitWriter::new();

        // Layer 0: not yet included (true inclusion layer is 1).
        enc_block.first_included_layer = Some(1);
        let included0 = encode_block_header(&mut enc_state, 0, 0, 0, &mut enc_block, &mut w);
        assert!(!included0);
        assert!(!enc_block.included);

        let included1 = encode_block_header(&mut enc_state, 0, 0, 1, &mut enc_block, &mut w);
        assert!(included1);
        assert!(enc_block.included);

        let bytes = w.finish();
        let mut dec_block = CodeBlock::new(Rect::from_corners(0, 0, 64, 64));
        let mut dec_state = SubbandPacketState::new_for_decoding(1, 1);
        let mut r = ForwardBitReader::new(&bytes);

        let got0 = decode_block_header(&mut dec_state, 0, 0, 0, &mut dec_block, &mut r).unwrap();
        assert_eq!(got0, None);
        let got1 = decode_block_header(&mut dec_state, 0, 0, 1, &mut dec_block, &mut r).unwrap();
        assert_eq!(got1, Some(100));
    }

    #[test]
    fn continuation_bit_stays_quiet_after_inclusion() {
        let mut blocks: Vec<CodeBlock> = (0..2)
            .map(|_| {
                let mut b = CodeBlock::new(Rect::from_corners(0, 0, 32, 32));
                b.coded_data = vec![1u8; 5];
                b
            })
            .collect();
        blocks[0].first_included_layer = Some(0);
        blocks[1].first_included_layer = Some(1);
        let mut enc_state = SubbandPacketState::new_for_encoding(2, 1, &[0, 1], &[0, 0]);
        let mut w = ForwardBitWriter::new();

        for layer in 0..3u32 {
            for bx in 0..2usize {
                encode_block_header(&mut enc_state, bx, 0, layer, &mut blocks[bx], &mut w);
            }
        }
        let bytes = w.finish();

        let mut dec_blocks = [
            CodeBlock::new(Rect::from_corners(0, 0, 32, 32)),
            CodeBlock::new(Rect::from_corners(0, 0, 32, 32)),
        ];
        let mut dec_state = SubbandPacketState::new_for_decoding(2, 1);
        let mut r = ForwardBitReader::new(&bytes);
        let mut results = Vec::new();
        for layer in 0..3u32 {
            for bx in 0..2usize {
                results.push(
                    decode_block_header(&mut dec_state, bx, 0, layer, &mut dec_blocks[bx], &mut r)
                        .unwrap(),
                );
            }
        }
        // layer0: block0 included, block1 not; layer1: block0 quiet, block1 included; layer2: both quiet.
        assert_eq!(results, vec![Some(5), None, None, Some(5), None, None]);
    }

    #[test]
    fn packet_presence_round_trips() {
        let mut w = ForwardBitWriter::new();
        write_packet_presence(&mut w, false);
        let bytes = w.finish();
        let mut r = ForwardBitReader::new(&bytes);
        assert!(!read_packet_presence(&mut r).unwrap());
    }
}
