//! Tile-component encode/decode pipeline (spec.md §4.1/§4.3/§4.5): drives
//! [`crate::resolution`]'s wavelet decomposition, [`crate::quantization`],
//! [`crate::codeblock`] partitioning, and the [`crate::ht`] cleanup-pass
//! coder for a single component of a single tile.
//!
//! Buffers here are tile-component-local (the component's sample rectangle
//! is treated as if it started at `(0, 0)`); [`crate::subband`]'s
//! canvas-space `subband_rect` formula is used only for precinct/packet
//! geometry bookkeeping elsewhere, not for the per-level buffer layout a
//! tile-component computes directly from [`crate::wavelet`]'s own per-level
//! dimensions — a single source of truth for how big each band actually is.
//!
//! A code-block's `coded_data` is self-describing: a 4-byte little-endian
//! MagSgn length prefix followed by the assembled MagSgn/MEL/VLC/Scup bytes
//! [`crate::ht::BlockStream::assemble`] produces, since
//! [`crate::ht::BlockStream::disassemble`] needs that split point supplied
//! externally and the real format's packet-header length accounting (Lcup
//! minus Scup) isn't modeled at this layer.

use crate::bit_io::{ForwardBitReader, ForwardBitWriter};
use crate::codeblock::{partition_into_code_blocks, CodeBlock};
use crate::error::{CoreError, Notice};
use crate::geometry::Rect;
use crate::ht::{decode_cleanup_pass, encode_cleanup_pass, BlockDims, BlockStream};
use crate::markers::ParamQcd;
use crate::precinct::{
    decode_block_header, encode_block_header, read_packet_presence, write_packet_presence, SubbandPacketState,
};
use crate::quantization::{dequantize_subband, quantize_subband, reversible_kmax, subband_gain};
use crate::resolution::{forward_irreversible, forward_reversible, Level};
use crate::wavelet::{inverse_level_53, inverse_level_97, Subbands};

const MAGSGN_LEN_PREFIX: usize = 4;

fn pack_coded_data(stream: &BlockStream) -> Vec<u8> {
    let Ok(assembled) = stream.assemble() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(MAGSGN_LEN_PREFIX + assembled.len());
    out.extend_from_slice(&(stream.magsgn.len() as u32).to_le_bytes());
    out.extend_from_slice(&assembled);
    out
}

/// Disassembles and decodes one code-block's coded bytes. A failure here
/// (malformed MagSgn unstuffing, `U > Kmax`, Scup out of range, bitstream
/// exhaustion — spec.md §4.5) is fatal in strict mode; in resilient mode it
/// is recorded in `notices` and the block is substituted with zeros, per
/// spec.md §7's propagation policy for `BlockDecodeFailure`.
fn unpack_coded_data(
    dims: BlockDims,
    data: &[u8],
    u_bits_cap: u8,
    resilient: bool,
    notices: &mut Vec<Notice>,
) -> Result<Vec<i32>, CoreError> {
    if data.len() <= MAGSGN_LEN_PREFIX {
        return Ok(vec![0i32; dims.width * dims.height]);
    }
    let magsgn_len = u32::from_le_bytes(data[..MAGSGN_LEN_PREFIX].try_into().unwrap()) as usize;
    let body = &data[MAGSGN_LEN_PREFIX..];
    let result = BlockStream::disassemble(body, magsgn_len).and_then(|stream| decode_cleanup_pass(dims, &stream, u_bits_cap));
    match result {
        Ok(values) => Ok(values),
        Err(e) if resilient && !e.always_fatal() => {
            notices.push(Notice {
                code: e.code(),
                message: e.to_string(),
            });
            Ok(vec![0i32; dims.width * dims.height])
        }
        Err(e) => Err(e),
    }
}

/// One subband's worth of code-blocks within a single tile-component.
pub struct SubbandCoding {
    pub width: usize,
    pub height: usize,
    pub qcd_index: usize,
    pub block_rects: Vec<Rect>,
    pub blocks: Vec<CodeBlock>,
    /// Code-block grid shape; `block_rects`/`blocks` are in raster
    /// (row-major) order over this `blocks_wide x blocks_high` grid, which
    /// is also the shape the precinct packet header's tag trees are built
    /// over (spec.md §4.6). This core always groups one subband's whole
    /// code-block grid into a single precinct (the simplest per-resolution
    /// precinct partition spec.md §3.3 allows).
    pub blocks_wide: usize,
    pub blocks_high: usize,
}

impl SubbandCoding {
    fn new(width: usize, height: usize, qcd_index: usize, block_w: u32, block_h: u32) -> Self {
        let rect = Rect::from_corners(0, 0, width as u32, height as u32);
        let block_rects = partition_into_code_blocks(rect, block_w, block_h);
        let blocks = block_rects.iter().map(|&r| CodeBlock::new(r)).collect();
        let blocks_wide = if rect.is_empty() { 0 } else { (width as u32).div_ceil(block_w).max(1) as usize };
        let blocks_high = if rect.is_empty() { 0 } else { (height as u32).div_ceil(block_h).max(1) as usize };
        Self {
            width,
            height,
            qcd_index,
            block_rects,
            blocks,
            blocks_wide,
            blocks_high,
        }
    }

    fn gather<T: Copy + Default>(&self, samples: &[T], rect: Rect) -> Vec<T> {
        let w = rect.w() as usize;
        let mut out = Vec::with_capacity(w * rect.h() as usize);
        for y in rect.y0()..rect.y1() {
            let row_start = y as usize * self.width + rect.x0() as usize;
            out.extend_from_slice(&samples[row_start..row_start + w]);
        }
        out
    }

    fn scatter<T: Copy>(&self, out: &mut [T], rect: Rect, values: &[T]) {
        let w = rect.w() as usize;
        for (row, y) in (rect.y0()..rect.y1()).enumerate() {
            let dst_start = y as usize * self.width + rect.x0() as usize;
            out[dst_start..dst_start + w].copy_from_slice(&values[row * w..(row + 1) * w]);
        }
    }

    fn code_reversible(&mut self, coefficients: &[i32], qcd: &ParamQcd, u_bits_cap: u8) {
        let kmax = reversible_kmax(qcd, self.qcd_index);
        let cap = u_bits_cap.min(kmax as u8 + 1);
        for (idx, rect) in self.block_rects.clone().iter().enumerate() {
            let block_vals = self.gather(coefficients, *rect);
            let dims = BlockDims {
                width: rect.w() as usize,
                height: rect.h() as usize,
            };
            if block_vals.iter().all(|&v| v == 0) {
                self.blocks[idx].coded_data = Vec::new();
                self.blocks[idx].coding_passes = 0;
                continue;
            }
            let stream = encode_cleanup_pass(dims, &block_vals, cap);
            let max_bits = block_vals.iter().map(|&v| bits_needed(v.unsigned_abs())).max().unwrap_or(0);
            self.blocks[idx].zero_bit_planes = kmax.saturating_sub(max_bits) as u8;
            self.blocks[idx].coded_data = pack_coded_data(&stream);
            self.blocks[idx].coding_passes = 1;
        }
    }

    fn decode_reversible(&self, qcd: &ParamQcd, u_bits_cap: u8, resilient: bool, notices: &mut Vec<Notice>) -> Result<Vec<i32>, CoreError> {
        let kmax = reversible_kmax(qcd, self.qcd_index);
        let cap = u_bits_cap.min(kmax as u8 + 1);
        let mut out = vec![0i32; self.width * self.height];
        for (idx, rect) in self.block_rects.iter().enumerate() {
            if self.blocks[idx].coded_data.is_empty() {
                continue;
            }
            let dims = BlockDims {
                width: rect.w() as usize,
                height: rect.h() as usize,
            };
            let values = unpack_coded_data(dims, &self.blocks[idx].coded_data, cap, resilient, notices)?;
            self.scatter(&mut out, *rect, &values);
        }
        Ok(out)
    }

    fn code_irreversible(&mut self, coefficients: &[f32], qcd: &ParamQcd, gain: f32, u_bits_cap: u8) {
        let kmax = reversible_kmax(qcd, self.qcd_index);
        let cap = u_bits_cap.min(kmax as u8 + 1);
        for (idx, rect) in self.block_rects.clone().iter().enumerate() {
            let block_vals = self.gather(coefficients, *rect);
            let quantized = quantize_subband(&block_vals, qcd, self.qcd_index, gain);
            let dims = BlockDims {
                width: rect.w() as usize,
                height: rect.h() as usize,
            };
            if quantized.iter().all(|&v| v == 0) {
                self.blocks[idx].coded_data = Vec::new();
                self.blocks[idx].coding_passes = 0;
                continue;
            }
            let stream = encode_cleanup_pass(dims, &quantized, cap);
            let max_bits = quantized.iter().map(|&v| bits_needed(v.unsigned_abs())).max().unwrap_or(0);
            self.blocks[idx].zero_bit_planes = kmax.saturating_sub(max_bits) as u8;
            self.blocks[idx].coded_data = pack_coded_data(&stream);
            self.blocks[idx].coding_passes = 1;
        }
    }

    fn decode_irreversible(
        &self,
        qcd: &ParamQcd,
        gain: f32,
        u_bits_cap: u8,
        resilient: bool,
        notices: &mut Vec<Notice>,
    ) -> Result<Vec<f32>, CoreError> {
        let kmax = reversible_kmax(qcd, self.qcd_index);
        let cap = u_bits_cap.min(kmax as u8 + 1);
        let mut out = vec![0f32; self.width * self.height];
        for (idx, rect) in self.block_rects.iter().enumerate() {
            if self.blocks[idx].coded_data.is_empty() {
                continue;
            }
            let dims = BlockDims {
                width: rect.w() as usize,
                height: rect.h() as usize,
            };
            let quantized = unpack_coded_data(dims, &self.blocks[idx].coded_data, cap, resilient, notices)?;
            let values = dequantize_subband(&quantized, qcd, self.qcd_index, gain);
            self.scatter(&mut out, *rect, &values);
        }
        Ok(out)
    }
}

fn bits_needed(magnitude: u32) -> u32 {
    u32::BITS - magnitude.leading_zeros()
}

/// A whole tile-component's resolution hierarchy, coded band by band.
///
/// `ll` is the final (coarsest) LL band, resolution 0; `details[r - 1]`
/// holds `(HL, LH, HH)` for resolution `r` (`1..=num_decompositions`), from
/// coarsest to finest, matching QCD's subband ordering.
pub struct TileComponent {
    pub width: usize,
    pub height: usize,
    pub num_decompositions: u32,
    pub ll: SubbandCoding,
    pub details: Vec<(SubbandCoding, SubbandCoding, SubbandCoding)>,
}

fn band_dims(w: usize, h: usize) -> (usize, usize, usize, usize) {
    // (ll_w, ll_h, hl_w/hh_w, lh_h/hh_h)
    (w.div_ceil(2), h.div_ceil(2), w / 2, h / 2)
}

/// Resolution-level subband index into QCD's `subband_values` (0 = LL, then
/// HL/LH/HH per resolution from coarsest to finest). `orientation_offset`
/// is 0/1/2 for HL/LH/HH.
fn qcd_index(resolution: u32, orientation_offset: usize) -> usize {
    if resolution == 0 {
        0
    } else {
        3 * (resolution as usize - 1) + 1 + orientation_offset
    }
}

impl TileComponent {
    /// Builds the subband/code-block geometry (no coefficients yet) for a
    /// `width x height` tile-component.
    pub fn new_geometry(width: usize, height: usize, num_decompositions: u32, block_w: u32, block_h: u32) -> Self {
        // per_level_dims[i] describes the split taken at recursion depth i
        // (0 = finest, applied directly to the tile-component samples).
        let mut per_level_dims = Vec::with_capacity(num_decompositions as usize);
        let (mut w, mut h) = (width, height);
        for _ in 0..num_decompositions {
            let (ll_w, ll_h, hl_w, hh_h) = band_dims(w, h);
            per_level_dims.push((ll_w, ll_h, hl_w, hh_h));
            w = ll_w;
            h = ll_h;
        }
        let mut details = Vec::with_capacity(num_decompositions as usize);
        for r in 1..=num_decompositions {
            let (ll_w, ll_h, hl_w, hh_h) = per_level_dims[(num_decompositions - r) as usize];
            let hl = SubbandCoding::new(hl_w, ll_h, qcd_index(r, 0), block_w, block_h);
            let lh = SubbandCoding::new(ll_w, hh_h, qcd_index(r, 1), block_w, block_h);
            let hh = SubbandCoding::new(hl_w, hh_h, qcd_index(r, 2), block_w, block_h);
            details.push((hl, lh, hh));
        }
        let (final_w, final_h) = if num_decompositions == 0 {
            (width, height)
        } else {
            let (ll_w, ll_h, _, _) = per_level_dims[(num_decompositions - 1) as usize];
            (ll_w, ll_h)
        };
        let ll = SubbandCoding::new(final_w, final_h, qcd_index(0, 0), block_w, block_h);
        Self {
            width,
            height,
            num_decompositions,
            ll,
            details,
        }
    }

    /// Runs the reversible forward path and codes every subband's
    /// code-blocks with the HT cleanup-pass coder. `u_bits_cap` bounds
    /// MagSgn magnitude bit-width per spec.md §4.5.
    pub fn encode_reversible(&mut self, samples: &[i32], qcd: &ParamQcd, u_bits_cap: u8) {
        if self.num_decompositions == 0 {
            self.ll.code_reversible(samples, qcd, u_bits_cap);
            return;
        }
        let levels: Vec<Level<i32>> = forward_reversible(samples, self.width, self.height, self.num_decompositions);
        let final_ll = &levels.last().expect("at least one level").subbands.ll;
        self.ll.code_reversible(final_ll, qcd, u_bits_cap);
        for (r, (hl, lh, hh)) in self.details.iter_mut().enumerate() {
            let level = &levels[self.num_decompositions as usize - 1 - r];
            hl.code_reversible(&level.subbands.hl, qcd, u_bits_cap);
            lh.code_reversible(&level.subbands.lh, qcd, u_bits_cap);
            hh.code_reversible(&level.subbands.hh, qcd, u_bits_cap);
        }
    }

    /// Decodes every subband's code-blocks and runs the inverse reversible
    /// transform, reconstructing the tile-component's samples exactly (when
    /// every block round-trips) or losslessly up to any blocks this core
    /// chose not to code (all-zero blocks are never emitted).
    pub fn decode_reversible(&self, qcd: &ParamQcd, u_bits_cap: u8, resilient: bool, notices: &mut Vec<Notice>) -> Result<Vec<i32>, CoreError> {
        Ok(self
            .decode_reversible_to(qcd, u_bits_cap, self.num_decompositions, resilient, notices)?
            .0)
    }

    /// As [`decode_reversible`](Self::decode_reversible), but stops after
    /// `resolutions_to_reconstruct` inverse DWT levels instead of all
    /// `num_decompositions`, returning the reduced-resolution samples plus
    /// their width/height (spec.md §4.1 `restrict_input_resolution`). Every
    /// code-block decode failure is routed through `resilient`/`notices`
    /// (spec.md §7): fatal in strict mode, zero-substituted with a recorded
    /// notice otherwise.
    pub fn decode_reversible_to(
        &self,
        qcd: &ParamQcd,
        u_bits_cap: u8,
        resolutions_to_reconstruct: u32,
        resilient: bool,
        notices: &mut Vec<Notice>,
    ) -> Result<(Vec<i32>, usize, usize), CoreError> {
        let mut ll = self.ll.decode_reversible(qcd, u_bits_cap, resilient, notices)?;
        let target = resolutions_to_reconstruct.min(self.num_decompositions);
        if target == 0 {
            return Ok((ll, self.ll.width, self.ll.height));
        }
        let mut level_w = self.ll.width;
        let mut level_h = self.ll.height;
        // Ascending resolution order: undo the coarsest split first (the
        // one that produced the final LL), finest split last, mirroring
        // resolution.rs's `levels.iter().rev()` (levels are finest-first).
        for r in 1..=target {
            let (hl, lh, hh) = &self.details[r as usize - 1];
            let hl_vals = hl.decode_reversible(qcd, u_bits_cap, resilient, notices)?;
            let lh_vals = lh.decode_reversible(qcd, u_bits_cap, resilient, notices)?;
            let hh_vals = hh.decode_reversible(qcd, u_bits_cap, resilient, notices)?;
            let sb = Subbands {
                ll,
                hl: hl_vals,
                lh: lh_vals,
                hh: hh_vals,
                ll_w: level_w,
                ll_h: level_h,
            };
            let (out_w, out_h) = self.level_output_dims(r);
            ll = inverse_level_53(&sb, out_w, out_h);
            level_w = out_w;
            level_h = out_h;
        }
        Ok((ll, level_w, level_h))
    }

    /// As [`encode_reversible`](Self::encode_reversible), for the
    /// irreversible (9/7 + scalar dead-zone) path.
    pub fn encode_irreversible(&mut self, samples: &[f32], qcd: &ParamQcd, u_bits_cap: u8) {
        if self.num_decompositions == 0 {
            self.ll.code_irreversible(samples, qcd, subband_gain(true, false), u_bits_cap);
            return;
        }
        let levels: Vec<Level<f32>> = forward_irreversible(samples, self.width, self.height, self.num_decompositions);
        let final_ll = &levels.last().expect("at least one level").subbands.ll;
        self.ll.code_irreversible(final_ll, qcd, subband_gain(true, false), u_bits_cap);
        for (r, (hl, lh, hh)) in self.details.iter_mut().enumerate() {
            let level = &levels[self.num_decompositions as usize - 1 - r];
            hl.code_irreversible(&level.subbands.hl, qcd, subband_gain(false, false), u_bits_cap);
            lh.code_irreversible(&level.subbands.lh, qcd, subband_gain(false, false), u_bits_cap);
            hh.code_irreversible(&level.subbands.hh, qcd, subband_gain(false, true), u_bits_cap);
        }
    }

    /// As [`decode_reversible`](Self::decode_reversible), for the
    /// irreversible path.
    pub fn decode_irreversible(&self, qcd: &ParamQcd, u_bits_cap: u8, resilient: bool, notices: &mut Vec<Notice>) -> Result<Vec<f32>, CoreError> {
        Ok(self
            .decode_irreversible_to(qcd, u_bits_cap, self.num_decompositions, resilient, notices)?
            .0)
    }

    /// As [`decode_reversible_to`](Self::decode_reversible_to), for the
    /// irreversible path.
    pub fn decode_irreversible_to(
        &self,
        qcd: &ParamQcd,
        u_bits_cap: u8,
        resolutions_to_reconstruct: u32,
        resilient: bool,
        notices: &mut Vec<Notice>,
    ) -> Result<(Vec<f32>, usize, usize), CoreError> {
        let mut ll = self.ll.decode_irreversible(qcd, subband_gain(true, false), u_bits_cap, resilient, notices)?;
        let target = resolutions_to_reconstruct.min(self.num_decompositions);
        if target == 0 {
            return Ok((ll, self.ll.width, self.ll.height));
        }
        let mut level_w = self.ll.width;
        let mut level_h = self.ll.height;
        for r in 1..=target {
            let (hl, lh, hh) = &self.details[r as usize - 1];
            let hl_vals = hl.decode_irreversible(qcd, subband_gain(false, false), u_bits_cap, resilient, notices)?;
            let lh_vals = lh.decode_irreversible(qcd, subband_gain(false, false), u_bits_cap, resilient, notices)?;
            let hh_vals = hh.decode_irreversible(qcd, subband_gain(false, true), u_bits_cap, resilient, notices)?;
            let sb = Subbands {
                ll,
                hl: hl_vals,
                lh: lh_vals,
                hh: hh_vals,
                ll_w: level_w,
                ll_h: level_h,
            };
            let (out_w, out_h) = self.level_output_dims(r);
            ll = inverse_level_97(&sb, out_w, out_h);
            level_w = out_w;
            level_h = out_h;
        }
        Ok((ll, level_w, level_h))
    }

    /// Full-resolution dims produced by inverting resolution `r`'s split:
    /// `r == num_decompositions` is the tile-component's own size, and every
    /// coarser `r` is the LL size one split finer.
    fn level_output_dims(&self, r: u32) -> (usize, usize) {
        if r == self.num_decompositions {
            return (self.width, self.height);
        }
        let (hl, lh, _) = &self.details[r as usize]; // one level finer than r
        (lh.width, hl.height)
    }

    /// Subbands belonging to resolution `r`: the lone LL band for `r == 0`,
    /// else that resolution's HL/LH/HH triple, in the order spec.md §4.6
    /// walks a packet header ("{LL}... or {HL, LH, HH}").
    fn subbands_for_resolution_mut(&mut self, r: u32) -> Vec<&mut SubbandCoding> {
        if r == 0 {
            vec![&mut self.ll]
        } else {
            let (hl, lh, hh) = &mut self.details[r as usize - 1];
            vec![hl, lh, hh]
        }
    }

    /// Encodes resolution `r`'s single packet (spec.md §4.6): the
    /// packet-presence bit, then every involved subband's inclusion/
    /// zero-bitplane tag trees and code-block lengths, followed by the
    /// included code-blocks' coded bytes. Since this core supports exactly
    /// one quality layer and one precinct per resolution, a fresh
    /// [`SubbandPacketState`] per subband is built and spent in a single
    /// call; there is no cross-packet persistence to manage.
    pub fn encode_packet(&mut self, resolution: u32) -> Vec<u8> {
        let subbands = self.subbands_for_resolution_mut(resolution);
        let any_included = subbands.iter().any(|sb| sb.blocks.iter().any(|b| !b.coded_data.is_empty()));
        let mut writer = ForwardBitWriter::new();
        write_packet_presence(&mut writer, any_included);
        if !any_included {
            return writer.finish();
        }
        let mut body = Vec::new();
        for sb in subbands {
            let first_included_layers: Vec<i32> = sb
                .blocks
                .iter()
                .map(|b| if b.coded_data.is_empty() { 1 } else { 0 })
                .collect();
            let zero_bit_planes: Vec<i32> = sb.blocks.iter().map(|b| b.zero_bit_planes as i32).collect();
            let mut state =
                SubbandPacketState::new_for_encoding(sb.blocks_wide, sb.blocks_high, &first_included_layers, &zero_bit_planes);
            for by in 0..sb.blocks_high {
                for bx in 0..sb.blocks_wide {
                    let idx = by * sb.blocks_wide + bx;
                    if encode_block_header(&mut state, bx, by, 0, &mut sb.blocks[idx], &mut writer) {
                        body.extend_from_slice(&sb.blocks[idx].coded_data);
                    }
                }
            }
        }
        let mut out = writer.finish();
        out.extend(body);
        out
    }

    /// Decodes resolution `r`'s packet from the front of `bytes` (which may
    /// hold more data after this packet). Returns the number of bytes this
    /// packet consumed so the caller can advance to the next packet.
    pub fn decode_packet(&mut self, resolution: u32, bytes: &[u8]) -> Result<usize, CoreError> {
        let mut reader = ForwardBitReader::new(bytes);
        if !read_packet_presence(&mut reader)? {
            return Ok(1);
        }
        let subbands = self.subbands_for_resolution_mut(resolution);
        let mut included: Vec<(usize, usize, usize)> = Vec::new(); // (subband index, block index, length)
        for (sidx, sb) in subbands.into_iter().enumerate() {
            let mut state = SubbandPacketState::new_for_decoding(sb.blocks_wide, sb.blocks_high);
            for by in 0..sb.blocks_high {
                for bx in 0..sb.blocks_wide {
                    let idx = by * sb.blocks_wide + bx;
                    if let Some(len) = decode_block_header(&mut state, bx, by, 0, &mut sb.blocks[idx], &mut reader)? {
                        included.push((sidx, idx, len));
                    }
                }
            }
        }
        let header_bytes = reader.bytes_consumed();
        let mut body_offset = header_bytes;
        let subbands = self.subbands_for_resolution_mut(resolution);
        for (sidx, bidx, len) in included {
            let sb = &mut subbands[sidx];
            sb.blocks[bidx].coded_data = bytes
                .get(body_offset..body_offset + len)
                .ok_or_else(|| {
                    crate::error::block_decode_failure!(43, "packet body truncated before code-block data ended")
                })?
                .to_vec();
            body_offset += len;
        }
        Ok(body_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::QuantStyle;

    fn reversible_qcd(num_decompositions: u32) -> ParamQcd {
        ParamQcd {
            guard_bits: 2,
            style: QuantStyle::NoQuantization,
            subband_values: vec![16 << 3; 1 + 3 * num_decompositions as usize],
        }
    }

    fn irreversible_qcd(num_decompositions: u32) -> ParamQcd {
        ParamQcd {
            guard_bits: 2,
            style: QuantStyle::ScalarExpounded,
            subband_values: vec![(6u16 << 11) | 0; 1 + 3 * num_decompositions as usize],
        }
    }

    #[test]
    fn geometry_partitions_every_resolution() {
        let tc = TileComponent::new_geometry(17, 13, 2, 8, 8);
        assert_eq!(tc.details.len(), 2);
        assert!(!tc.ll.block_rects.is_empty());
    }

    #[test]
    fn reversible_round_trips_a_small_tile_component() {
        let (w, h) = (16, 16);
        let samples: Vec<i32> = (0..(w * h) as i32).map(|v| (v % 200) - 100).collect();
        let qcd = reversible_qcd(2);
        let mut tc = TileComponent::new_geometry(w, h, 2, 8, 8);
        tc.encode_reversible(&samples, &qcd, 16);
        let mut notices = Vec::new();
        let back = tc.decode_reversible(&qcd, 16, false, &mut notices).unwrap();
        assert_eq!(back, samples);
    }

    #[test]
    fn reversible_all_zero_tile_component_round_trips() {
        let (w, h) = (12, 9);
        let samples = vec![0i32; w * h];
        let qcd = reversible_qcd(1);
        let mut tc = TileComponent::new_geometry(w, h, 1, 8, 8);
        tc.encode_reversible(&samples, &qcd, 16);
        let mut notices = Vec::new();
        let back = tc.decode_reversible(&qcd, 16, false, &mut notices).unwrap();
        assert_eq!(back, samples);
    }

    #[test]
    fn irreversible_round_trips_within_tolerance() {
        let (w, h) = (16, 16);
        let samples: Vec<f32> = (0..(w * h) as i32).map(|v| ((v % 200) - 100) as f32).collect();
        let qcd = irreversible_qcd(2);
        let mut tc = TileComponent::new_geometry(w, h, 2, 8, 8);
        tc.encode_irreversible(&samples, &qcd, 16);
        let mut notices = Vec::new();
        let back = tc.decode_irreversible(&qcd, 16, false, &mut notices).unwrap();
        let max_err = samples
            .iter()
            .zip(back.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 20.0, "max error {max_err}");
    }

    #[test]
    fn packet_round_trips_for_every_resolution() {
        let (w, h) = (20, 18);
        let num_decompositions = 2;
        let samples: Vec<i32> = (0..(w * h) as i32).map(|v| (v % 211) - 105).collect();
        let qcd = reversible_qcd(num_decompositions);
        let mut enc = TileComponent::new_geometry(w, h, num_decompositions, 8, 8);
        enc.encode_reversible(&samples, &qcd, 16);

        let mut dec = TileComponent::new_geometry(w, h, num_decompositions, 8, 8);
        for r in 0..=num_decompositions {
            let packet = enc.encode_packet(r);
            let consumed = dec.decode_packet(r, &packet).unwrap();
            assert_eq!(consumed, packet.len());
        }
        let mut notices = Vec::new();
        let back = dec.decode_reversible(&qcd, 16, false, &mut notices).unwrap();
        assert_eq!(back, samples);
    }

    #[test]
    fn empty_packet_is_a_single_zero_byte() {
        let (w, h) = (8, 8);
        let samples = vec![0i32; w * h];
        let qcd = reversible_qcd(0);
        let mut enc = TileComponent::new_geometry(w, h, 0, 8, 8);
        enc.encode_reversible(&samples, &qcd, 16);
        let packet = enc.encode_packet(0);
        assert_eq!(packet, vec![0x00]);

        let mut dec = TileComponent::new_geometry(w, h, 0, 8, 8);
        let consumed = dec.decode_packet(0, &packet).unwrap();
        assert_eq!(consumed, 1);
    }
}
