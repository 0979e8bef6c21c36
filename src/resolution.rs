//! Resolution-level geometry and the wavelet decomposition driving it
//! (spec.md §4.1/§4.3).
//!
//! Rather than streaming coefficients line-at-a-time across the whole
//! resolution hierarchy, this layer buffers a tile-component's full sample
//! rectangle once and recurses [`crate::wavelet`]'s whole-buffer level
//! transforms down to `num_decompositions` times — the per-line
//! symmetric-extension machinery still does the boundary handling, just one
//! level's full rectangle at a time rather than one output line at a time.
//! This keeps the external line-push/pull contract at the codestream
//! boundary (spec.md §4.1) without needing a second, line-granular
//! implementation of the same lifting math; see DESIGN.md's Open Question
//! 11 for why this buffers whole rectangles rather than rotating single
//! rows through [`crate::line_buffer`].
//!
//! The forward direction here (`forward_reversible`/`forward_irreversible`)
//! is the one live caller of [`crate::wavelet`]'s level transforms; the
//! matching inverse is driven directly by [`crate::tile_component`], which
//! walks resolutions per-level rather than holding a `Vec<Level<T>>` for a
//! whole tile-component at once.

use crate::wavelet::{self, Subbands};

/// One decomposition level's wavelet output, plus the input dimensions it
/// was computed from (needed to drive the matching inverse level).
pub struct Level<T> {
    pub subbands: Subbands<T>,
    pub input_w: usize,
    pub input_h: usize,
}

/// Applies the reversible (5/3) transform `num_decompositions` times,
/// recursing into the LL band each time. `levels[0]` is the finest split
/// (produced directly from the tile-component samples); `levels.last()`
/// holds the final LL band in its `subbands.ll`.
pub fn forward_reversible(samples: &[i32], w: usize, h: usize, num_decompositions: u32) -> Vec<Level<i32>> {
    let mut levels = Vec::with_capacity(num_decompositions as usize);
    let mut cur = samples.to_vec();
    let (mut cw, mut ch) = (w, h);
    for _ in 0..num_decompositions {
        let sb = wavelet::forward_level_53(&cur, cw, ch);
        let (next_w, next_h) = (sb.ll_w, sb.ll_h);
        cur = sb.ll.clone();
        levels.push(Level {
            subbands: sb,
            input_w: cw,
            input_h: ch,
        });
        cw = next_w;
        ch = next_h;
    }
    levels
}

/// As [`forward_reversible`], for the irreversible (9/7) float transform.
pub fn forward_irreversible(samples: &[f32], w: usize, h: usize, num_decompositions: u32) -> Vec<Level<f32>> {
    let mut levels = Vec::with_capacity(num_decompositions as usize);
    let mut cur = samples.to_vec();
    let (mut cw, mut ch) = (w, h);
    for _ in 0..num_decompositions {
        let sb = wavelet::forward_level_97(&cur, cw, ch);
        let (next_w, next_h) = (sb.ll_w, sb.ll_h);
        cur = sb.ll.clone();
        levels.push(Level {
            subbands: sb,
            input_w: cw,
            input_h: ch,
        });
        cw = next_w;
        ch = next_h;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversible_multi_level_produces_expected_depth_and_ll_size() {
        let (w, h) = (17, 13);
        let samples: Vec<i32> = (0..(w * h) as i32).map(|v| v % 251 - 125).collect();
        let levels = forward_reversible(&samples, w, h, 3);
        assert_eq!(levels.len(), 3);
        let final_ll = &levels.last().unwrap().subbands;
        assert_eq!(final_ll.ll.len(), final_ll.ll_w * final_ll.ll_h);
    }

    #[test]
    fn single_decomposition_round_trips() {
        let (w, h) = (6, 4);
        let samples: Vec<i32> = (0..(w * h) as i32).collect();
        let levels = forward_reversible(&samples, w, h, 1);
        assert_eq!(levels.len(), 1);
        let sb = &levels[0].subbands;
        let back = wavelet::inverse_level_53(sb, w, h);
        assert_eq!(back, samples);
    }

    #[test]
    fn irreversible_multi_level_produces_expected_depth() {
        let (w, h) = (9, 9);
        let samples: Vec<f32> = (0..(w * h) as i32).map(|v| (v % 200) as f32 - 100.0).collect();
        let levels = forward_irreversible(&samples, w, h, 2);
        assert_eq!(levels.len(), 2);
    }
}
