//! Code-block state (spec.md §4.1/§4.5): geometry, per-layer inclusion
//! bookkeeping, and the coded bytes produced by [`crate::ht`].
//!
//! Mirrors the teacher's `J2kCodeBlock` fields (`width`/`height`,
//! `zero_bit_planes` i.e. missing MSBs, `coding_passes`) but holds no
//! `Vec<J2kSubband>` parent pointer — it is owned by a [`crate::allocator::
//! Slab`] and referenced by index from its subband.

use crate::geometry::Rect;

#[derive(Debug, Clone)]
pub struct CodeBlock {
    pub rect: Rect,
    /// Number of all-zero most-significant bit-planes, signaled once via
    /// the subband's zero-bitplane tag tree at first inclusion.
    pub zero_bit_planes: u8,
    /// True once this code-block has appeared in some layer's packet.
    pub included: bool,
    /// Layer index (0-based) at which this code-block first became
    /// included, used to drive its inclusion tag-tree leaf.
    pub first_included_layer: Option<u32>,
    /// The HT cleanup-pass bytes for this block (empty until coded).
    pub coded_data: Vec<u8>,
    /// Number of coding passes represented in `coded_data` (1 for
    /// cleanup-only, per spec.md §4.5).
    pub coding_passes: u8,
}

impl CodeBlock {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            zero_bit_planes: 0,
            included: false,
            first_included_layer: None,
            coded_data: Vec::new(),
            coding_passes: 0,
        }
    }

    pub fn mark_included(&mut self, layer: u32) {
        if !self.included {
            self.included = true;
            self.first_included_layer = Some(layer);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }
}

/// Splits a subband rectangle into code-block rectangles of at most
/// `block_w x block_h`, aligned to multiples of the block size from the
/// canvas origin (spec.md §4.1's code-block partition rule).
pub fn partition_into_code_blocks(subband_rect: Rect, block_w: u32, block_h: u32) -> Vec<Rect> {
    if subband_rect.is_empty() {
        return Vec::new();
    }
    let mut blocks = Vec::new();
    let start_x = (subband_rect.x0() / block_w) * block_w;
    let start_y = (subband_rect.y0() / block_h) * block_h;
    let mut y = start_y;
    while y < subband_rect.y1() {
        let mut x = start_x;
        while x < subband_rect.x1() {
            let block = Rect::from_corners(x, y, x + block_w, y + block_h).intersect(&subband_rect);
            if !block.is_empty() {
                blocks.push(block);
            }
            x += block_w;
        }
        y += block_h;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_evenly_divisible_subband() {
        let subband = Rect::from_corners(0, 0, 8, 8);
        let blocks = partition_into_code_blocks(subband, 4, 4);
        assert_eq!(blocks.len(), 4);
    }

    #[test]
    fn partitions_subband_with_ragged_edge() {
        let subband = Rect::from_corners(0, 0, 9, 5);
        let blocks = partition_into_code_blocks(subband, 4, 4);
        // 3 columns (4,4,1) x 2 rows (4,1) = 6 blocks, all clipped to the
        // subband rectangle.
        assert_eq!(blocks.len(), 6);
        for b in &blocks {
            assert!(b.x1() <= 9 && b.y1() <= 5);
        }
    }

    #[test]
    fn partitions_subband_not_aligned_to_origin() {
        let subband = Rect::from_corners(5, 5, 13, 13);
        let blocks = partition_into_code_blocks(subband, 8, 8);
        assert_eq!(blocks.len(), 4);
    }
}
