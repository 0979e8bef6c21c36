//! Tag-tree coding of packet-header inclusion and missing-MSB information
//! (spec.md §4.6).
//!
//! A tag tree covers a precinct's code-blocks (width x height leaves) with
//! a quad-tree of coarser levels, each node holding the minimum of its
//! children. Encoding/decoding a leaf against a threshold walks the path
//! from the root down, emitting or consuming one bit per level for as long
//! as the node's currently-known lower bound is both below the threshold
//! and below the node's true value; a node becomes permanently `known`
//! once its lower bound catches up to its true value. This is the
//! algorithm JPEG 2000 Part 1 Annex B.10 describes and every encoder since
//! has reused verbatim; HTJ2K packet headers use it unchanged for both the
//! inclusion tree (value = the layer index at which a code-block first
//! becomes included) and the zero-bitplane tree (value = the number of
//! all-zero most-significant bit-planes).
//!
//! Packet headers use the same forward, stuff-after-0xFF bit discipline as
//! MagSgn (see [`crate::bit_io`]).

use crate::bit_io::{ForwardBitReader, ForwardBitWriter};
use crate::error::{block_decode_failure, CoreError};

struct Level {
    width: usize,
    height: usize,
    value: Vec<i32>,
    low: Vec<i32>,
    known: Vec<bool>,
}

impl Level {
    fn new(width: usize, height: usize) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            value: vec![0; n],
            low: vec![0; n],
            known: vec![false; n],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// A tag tree over a `width x height` grid of leaves.
pub struct TagTree {
    leaf_width: usize,
    leaf_height: usize,
    levels: Vec<Level>,
}

impl TagTree {
    fn build_levels(leaf_width: usize, leaf_height: usize) -> Vec<Level> {
        let mut levels = vec![Level::new(leaf_width.max(1), leaf_height.max(1))];
        let (mut w, mut h) = (leaf_width.max(1), leaf_height.max(1));
        while w > 1 || h > 1 {
            w = w.div_ceil(2);
            h = h.div_ceil(2);
            levels.push(Level::new(w, h));
        }
        levels
    }

    /// Builds a tree for decoding: node values are discovered lazily as
    /// bits are read, so no true values need to be known up front.
    pub fn new_for_decoding(leaf_width: usize, leaf_height: usize) -> Self {
        Self {
            leaf_width,
            leaf_height,
            levels: Self::build_levels(leaf_width, leaf_height),
        }
    }

    /// Builds a tree for encoding from the true leaf values (row-major,
    /// `leaf_width * leaf_height`), propagating each internal node's value
    /// as the minimum of its children.
    pub fn new_for_encoding(leaf_width: usize, leaf_height: usize, leaf_values: &[i32]) -> Self {
        let mut levels = Self::build_levels(leaf_width, leaf_height);
        levels[0].value.copy_from_slice(leaf_values);
        for l in 1..levels.len() {
            let (below_width, below_height) = (levels[l - 1].width, levels[l - 1].height);
            let mut values = vec![i32::MAX; levels[l].width * levels[l].height];
            for y in 0..below_height {
                for x in 0..below_width {
                    let child = levels[l - 1].value[y * below_width + x];
                    let idx = (y / 2) * levels[l].width + (x / 2);
                    values[idx] = values[idx].min(child);
                }
            }
            levels[l].value = values;
        }
        Self {
            leaf_width,
            leaf_height,
            levels,
        }
    }

    fn node_index(&self, level: usize, x: usize, y: usize) -> usize {
        self.levels[level].index(x >> level, y >> level)
    }

    /// Encodes leaf `(x, y)` against `threshold`, emitting bits for every
    /// node on the root-to-leaf path that isn't already known.
    pub fn encode_leaf(&mut self, x: usize, y: usize, threshold: i32, writer: &mut ForwardBitWriter) {
        let top = self.levels.len() - 1;
        let mut low = 0;
        for level in (0..=top).rev() {
            let idx = self.node_index(level, x, y);
            if self.levels[level].low[idx] < low {
                self.levels[level].low[idx] = low;
            }
            while !self.levels[level].known[idx] && self.levels[level].low[idx] < threshold {
                if self.levels[level].low[idx] < self.levels[level].value[idx] {
                    writer.write_bit(0);
                    self.levels[level].low[idx] += 1;
                } else {
                    writer.write_bit(1);
                    self.levels[level].known[idx] = true;
                }
            }
            low = self.levels[level].low[idx];
        }
    }

    /// Decodes leaf `(x, y)` against `threshold`. Returns `Some(value)`
    /// once the leaf's true value has been fully revealed (possibly on an
    /// earlier call at a lower threshold), `None` if only "value >=
    /// threshold" is known so far.
    pub fn decode_leaf(
        &mut self,
        x: usize,
        y: usize,
        threshold: i32,
        reader: &mut ForwardBitReader,
    ) -> Result<Option<i32>, CoreError> {
        if x >= self.leaf_width || y >= self.leaf_height {
            return Err(block_decode_failure!(
                30,
                "tag-tree leaf coordinate out of range"
            ));
        }
        let top = self.levels.len() - 1;
        let mut low = 0;
        for level in (0..=top).rev() {
            let idx = self.node_index(level, x, y);
            if self.levels[level].low[idx] < low {
                self.levels[level].low[idx] = low;
            }
            while !self.levels[level].known[idx] && self.levels[level].low[idx] < threshold {
                if reader.read_bit()? == 0 {
                    self.levels[level].low[idx] += 1;
                } else {
                    self.levels[level].known[idx] = true;
                    self.levels[level].value[idx] = self.levels[level].low[idx];
                }
            }
            low = self.levels[level].low[idx];
        }
        let leaf_idx = self.node_index(0, x, y);
        if self.levels[0].known[leaf_idx] {
            Ok(Some(self.levels[0].value[leaf_idx]))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_shot_threshold_reveals_exact_value() {
        let values = vec![3, 0, 1, 2];
        let mut enc = TagTree::new_for_encoding(2, 2, &values);
        let mut w = ForwardBitWriter::new();
        for (i, &v) in values.iter().enumerate() {
            enc.encode_leaf(i % 2, i / 2, v + 1, &mut w);
        }
        let bytes = w.finish();
        let mut dec = TagTree::new_for_decoding(2, 2);
        let mut r = ForwardBitReader::new(&bytes);
        for (i, &v) in values.iter().enumerate() {
            let got = dec.decode_leaf(i % 2, i / 2, v + 1, &mut r).unwrap();
            assert_eq!(got, Some(v));
        }
    }

    #[test]
    fn progressive_threshold_only_reveals_once_reached() {
        let values = vec![5];
        let mut enc = TagTree::new_for_encoding(1, 1, &values);
        let mut w = ForwardBitWriter::new();
        // Encoder and decoder must be driven with the same increasing
        // threshold sequence, mirroring layer-by-layer inclusion coding.
        for t in 0..=5 {
            enc.encode_leaf(0, 0, t, &mut w);
        }
        let bytes = w.finish();
        let mut dec = TagTree::new_for_decoding(1, 1);
        let mut r = ForwardBitReader::new(&bytes);
        for t in 0..5 {
            assert_eq!(dec.decode_leaf(0, 0, t, &mut r).unwrap(), None);
        }
        assert_eq!(dec.decode_leaf(0, 0, 5, &mut r).unwrap(), Some(5));
    }

    #[test]
    fn non_power_of_two_grid_builds_without_panic() {
        let values = vec![1, 2, 3, 4, 5, 6];
        let enc = TagTree::new_for_encoding(3, 2, &values);
        assert!(enc.levels.len() >= 2);
    }
}
