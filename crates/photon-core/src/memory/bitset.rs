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

//! A fixed-length bitset backed by `u64` words.

/// A fixed-length bitset wrapped around a `Vec<u64>`.
///
/// Used for per-call "visited" tracking of grid cells and for decoded PVS
/// rows. Indices at or beyond [`BitSet::len`] read as unset and are ignored
/// on write.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BitSet {
    bits: Vec<u64>,
    len: usize,
}

impl BitSet {
    /// Creates a bitset able to hold `len` bits, all cleared.
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Number of addressable bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the bitset cannot hold any bit.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clears every bit, keeping the length.
    pub fn clear_all(&mut self) {
        self.bits.fill(0);
    }

    /// Sets the bit at the specified index to 1.
    pub fn set(&mut self, index: usize) {
        if index < self.len {
            self.bits[index / 64] |= 1 << (index % 64);
        }
    }

    /// Returns true if the bit at the specified index is set.
    pub fn is_set(&self, index: usize) -> bool {
        index < self.len && (self.bits[index / 64] & (1 << (index % 64))) != 0
    }

    /// Sets the bit and reports whether it was previously clear.
    ///
    /// Out-of-range indices return `false`.
    pub fn check_or_set(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        let word = &mut self.bits[index / 64];
        let mask = 1u64 << (index % 64);
        let was_clear = *word & mask == 0;
        *word |= mask;
        was_clear
    }

    /// Performs a bitwise OR with another bitset of any length.
    pub fn union_with(&mut self, other: &BitSet) {
        for (dst, src) in self.bits.iter_mut().zip(&other.bits) {
            *dst |= *src;
        }
        // Bits past our length may have come in from a longer operand.
        if let Some(last) = self.bits.last_mut() {
            let tail = self.len % 64;
            if tail != 0 {
                *last &= (1u64 << tail) - 1;
            }
        }
    }

    /// Iterates over the indices of set bits in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().flat_map(|(word_idx, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(word_idx * 64 + bit)
            })
        })
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_or_set_reports_first_visit_only() {
        let mut set = BitSet::new(130);
        assert!(set.check_or_set(129));
        assert!(!set.check_or_set(129));
        assert!(set.is_set(129));
        assert!(!set.check_or_set(130));
    }

    #[test]
    fn test_clear_all_keeps_length() {
        let mut set = BitSet::new(70);
        set.set(3);
        set.set(69);
        assert_eq!(set.count_ones(), 2);
        set.clear_all();
        assert_eq!(set.count_ones(), 0);
        assert_eq!(set.len(), 70);
    }

    #[test]
    fn test_iter_ones_ascending() {
        let mut set = BitSet::new(200);
        for i in [150, 0, 64, 63] {
            set.set(i);
        }
        assert_eq!(set.iter_ones().collect::<Vec<_>>(), vec![0, 63, 64, 150]);
    }

    #[test]
    fn test_union_masks_foreign_tail() {
        let mut small = BitSet::new(3);
        let mut big = BitSet::new(64);
        big.set(1);
        big.set(10);
        small.union_with(&big);
        assert_eq!(small.iter_ones().collect::<Vec<_>>(), vec![1]);
    }
}
