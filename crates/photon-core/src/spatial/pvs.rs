// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Potentially-visible-set rows and their run-length encoding.
//!
//! A compressed row is a byte stream. A zero byte is followed by a count
//! byte and stands for `count * 8` invisible leaves. Any other byte carries
//! eight visibility bits, least significant first. Bit `k` of the row refers
//! to leaf `k + 1`, since leaf 0 is the solid leaf and is never visible.

use super::map::LeafIndex;
use crate::memory::BitSet;

/// A set of leaves, indexed by leaf number.
///
/// Slot 0 exists but is never set by decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafBits {
    bits: BitSet,
}

impl LeafBits {
    /// Creates an empty set for a map with `leaf_count` real leaves.
    pub fn new(leaf_count: usize) -> Self {
        Self {
            bits: BitSet::new(leaf_count + 1),
        }
    }

    /// Creates a set containing every real leaf `1..=leaf_count`.
    pub fn all(leaf_count: usize) -> Self {
        let mut set = Self::new(leaf_count);
        for leaf in 1..=leaf_count {
            set.bits.set(leaf);
        }
        set
    }

    /// Removes every leaf, keeping the capacity.
    pub fn clear(&mut self) {
        self.bits.clear_all();
    }

    /// Number of leaf slots, including the solid leaf 0.
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Adds a leaf, returning `true` if it was not already present.
    pub fn insert(&mut self, leaf: LeafIndex) -> bool {
        self.bits.check_or_set(leaf.0 as usize)
    }

    /// Returns `true` if the leaf is in the set.
    pub fn contains(&self, leaf: LeafIndex) -> bool {
        self.bits.is_set(leaf.0 as usize)
    }

    /// Adds every leaf of `other`.
    pub fn union_with(&mut self, other: &LeafBits) {
        self.bits.union_with(&other.bits);
    }

    /// Number of leaves in the set.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Returns `true` if no leaf is in the set.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterates leaves in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = LeafIndex> + '_ {
        self.bits.iter_ones().map(|i| LeafIndex(i as u32))
    }
}

/// Decodes one compressed row into a fresh [`LeafBits`].
///
/// Decoding stops after `leaf_count` bits; a truncated run marker ends the
/// row early.
pub fn decompress(compressed: &[u8], leaf_count: usize) -> LeafBits {
    let mut out = LeafBits::new(leaf_count);
    let mut bit = 0usize;
    let mut bytes = compressed.iter();

    while bit < leaf_count {
        let Some(&byte) = bytes.next() else {
            break;
        };
        if byte == 0 {
            let Some(&run) = bytes.next() else {
                break;
            };
            bit += usize::from(run) * 8;
            continue;
        }
        for k in 0..8 {
            if bit + k >= leaf_count {
                break;
            }
            if byte & (1 << k) != 0 {
                out.bits.set(bit + k + 1);
            }
        }
        bit += 8;
    }
    out
}

/// Encodes a row, the inverse of [`decompress`]. Used to author test maps.
pub fn compress(visible: &LeafBits, leaf_count: usize) -> Vec<u8> {
    let row_bytes = leaf_count.div_ceil(8);
    let mut out = Vec::with_capacity(row_bytes);
    let mut zero_run = 0u8;

    for byte_idx in 0..row_bytes {
        let mut byte = 0u8;
        for k in 0..8 {
            let leaf = byte_idx * 8 + k + 1;
            if leaf <= leaf_count && visible.contains(LeafIndex(leaf as u32)) {
                byte |= 1 << k;
            }
        }
        if byte == 0 {
            zero_run += 1;
            if zero_run == u8::MAX {
                out.extend_from_slice(&[0, zero_run]);
                zero_run = 0;
            }
            continue;
        }
        if zero_run > 0 {
            out.extend_from_slice(&[0, zero_run]);
            zero_run = 0;
        }
        out.push(byte);
    }
    if zero_run > 0 {
        out.extend_from_slice(&[0, zero_run]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(set: &LeafBits) -> Vec<u32> {
        set.iter().map(|l| l.0).collect()
    }

    #[test]
    fn test_literal_bits_are_offset_by_one() {
        // 0b0000_0101: bits 0 and 2 set, i.e. leaves 1 and 3.
        let row = decompress(&[0b0000_0101], 8);
        assert_eq!(leaves(&row), vec![1, 3]);
        assert!(!row.contains(LeafIndex(0)));
    }

    #[test]
    fn test_zero_run_skips_eight_per_count() {
        // Skip 16 leaves, then bit 1 of the third byte: leaf 18.
        let row = decompress(&[0, 2, 0b0000_0010], 24);
        assert_eq!(leaves(&row), vec![18]);
    }

    #[test]
    fn test_decoding_stops_at_leaf_count() {
        let row = decompress(&[0xff], 5);
        assert_eq!(leaves(&row), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_truncated_run_marker() {
        let row = decompress(&[0b1, 0], 16);
        assert_eq!(leaves(&row), vec![1]);
    }

    #[test]
    fn test_compress_inverts_decompress() {
        let mut set = LeafBits::new(40);
        for leaf in [2, 3, 33, 40] {
            set.insert(LeafIndex(leaf));
        }
        let packed = compress(&set, 40);
        assert_eq!(packed, vec![0b0000_0110, 0, 3, 0b1000_0001]);
        assert_eq!(decompress(&packed, 40), set);
    }

    #[test]
    fn test_all_leaves() {
        let set = LeafBits::all(3);
        assert_eq!(leaves(&set), vec![1, 2, 3]);
        assert_eq!(set.count(), 3);
    }
}
