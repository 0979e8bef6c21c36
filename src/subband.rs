//! Subband geometry and coefficient storage (spec.md §4.1/§4.3).
//!
//! A subband's rectangle is derived from its tile-component's canvas-space
//! rectangle by the standard JPEG 2000 decomposition formula (Part 1 Annex
//! B.5): for a subband at decomposition level `d` (1 = finest split) with
//! horizontal/vertical offsets `xob`/`yob` (1 for HL/HH and LH/HH
//! respectively), `tbx0 = ceil((tcx0 - xob*2^(d-1)) / 2^d)` and likewise for
//! the other three corners. `htj2k-rs`'s [`crate::allocator`] arena
//! replaces the teacher's owned-`Vec<J2kSubband>` nesting so code-block
//! ownership never needs a back-pointer to its subband.

use crate::allocator::SlabIndex;
use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubbandOrientation {
    LL,
    HL,
    LH,
    HH,
}

impl SubbandOrientation {
    /// L2-norm gain factor used by quantization (spec.md §4.4).
    pub fn gain(self) -> f32 {
        match self {
            SubbandOrientation::LL => 1.0,
            SubbandOrientation::HL | SubbandOrientation::LH => 2.0,
            SubbandOrientation::HH => 4.0,
        }
    }

    fn offsets(self) -> (i64, i64) {
        match self {
            SubbandOrientation::LL => (0, 0),
            SubbandOrientation::HL => (1, 0),
            SubbandOrientation::LH => (0, 1),
            SubbandOrientation::HH => (1, 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Subband {
    pub orientation: SubbandOrientation,
    pub rect: Rect,
    /// Index into QCD/QCC's `subband_values`: 0 for the single LL subband
    /// at the coarsest resolution, otherwise `1 + 3*(level-1) + orientation`
    /// in HL/LH/HH order, counting from the coarsest decomposition level.
    pub qcd_index: usize,
    pub code_blocks: Vec<SlabIndex<crate::codeblock::CodeBlock>>,
}

impl Subband {
    pub fn new(orientation: SubbandOrientation, rect: Rect, qcd_index: usize) -> Self {
        Self {
            orientation,
            rect,
            qcd_index,
            code_blocks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }
}

fn ceil_div_i64(a: i64, b: i64) -> i64 {
    (a + b - 1).div_euclid(b)
}

/// Computes one subband's canvas-space rectangle given the tile-
/// component's rectangle, the orientation, and the decomposition level `d`
/// counted from the finest split (`d` in `1..=num_decompositions`). The
/// caller supplies the LL orientation with `d = num_decompositions` to get
/// the final low-pass band.
pub fn subband_rect(tile_component_rect: Rect, orientation: SubbandOrientation, level: u32) -> Rect {
    let (xob, yob) = orientation.offsets();
    let half = 1i64 << level.saturating_sub(1);
    let full = 1i64 << level;
    let corner = |v: u32, ob: i64| ceil_div_i64(v as i64 - ob * half, full).max(0) as u32;
    let x0 = corner(tile_component_rect.x0(), xob);
    let y0 = corner(tile_component_rect.y0(), yob);
    let x1 = corner(tile_component_rect.x1(), xob).max(x0);
    let y1 = corner(tile_component_rect.y1(), yob).max(y0);
    Rect::from_corners(x0, y0, x1, y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ll_subband_shrinks_by_full_divisor() {
        let tc = Rect::from_corners(0, 0, 512, 512);
        let r = subband_rect(tc, SubbandOrientation::LL, 3);
        assert_eq!((r.x0(), r.y0(), r.x1(), r.y1()), (0, 0, 64, 64));
    }

    #[test]
    fn hl_lh_hh_account_for_odd_offset() {
        let tc = Rect::from_corners(0, 0, 9, 9);
        let hl = subband_rect(tc, SubbandOrientation::HL, 1);
        let lh = subband_rect(tc, SubbandOrientation::LH, 1);
        let hh = subband_rect(tc, SubbandOrientation::HH, 1);
        assert_eq!((hl.x1(), hl.y1()), (4, 5));
        assert_eq!((lh.x1(), lh.y1()), (5, 4));
        assert_eq!((hh.x1(), hh.y1()), (4, 4));
    }

    #[test]
    fn gain_matches_orientation() {
        assert_eq!(SubbandOrientation::LL.gain(), 1.0);
        assert_eq!(SubbandOrientation::HH.gain(), 4.0);
    }
}
