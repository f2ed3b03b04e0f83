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

//! First-fit sub-allocator for a fixed-size backing buffer.
//!
//! Acceleration structures are placed into one large storage buffer. The
//! pool tracks which byte ranges of that buffer are in use, splitting a free
//! span into an alignment hole, the allocation and a tail, and coalescing
//! neighbouring free spans on release.

use crate::math::align_up;

/// A successful allocation: a byte range inside the pooled buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolBlock {
    /// Offset of the first byte, aligned as requested.
    pub offset: u64,
    /// Requested size in bytes.
    pub size: u64,
}

impl PoolBlock {
    /// One past the last byte of the block.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    begin: u64,
    end: u64,
    allocated: bool,
}

/// First-fit allocator over `[0, size)`.
///
/// Spans are kept sorted by offset and always tile the whole range, so
/// adjacent free spans can be merged by looking at direct neighbours only.
#[derive(Debug, Clone)]
pub struct FirstFitPool {
    spans: Vec<Span>,
    size: u64,
    min_alignment: u64,
    live: usize,
}

impl FirstFitPool {
    /// Creates a pool covering `size` bytes.
    ///
    /// # Arguments
    ///
    /// * `size` - Total bytes managed by the pool.
    /// * `expected_allocations` - Capacity hint for the span list.
    /// * `min_alignment` - Alignment applied to every allocation at minimum.
    pub fn new(size: u64, expected_allocations: usize, min_alignment: u64) -> Self {
        let mut spans = Vec::with_capacity(expected_allocations.max(1) * 2 + 1);
        spans.push(Span {
            begin: 0,
            end: size,
            allocated: false,
        });
        Self {
            spans,
            size,
            min_alignment: min_alignment.max(1),
            live: 0,
        }
    }

    /// Total bytes managed by the pool.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of blocks currently allocated.
    pub fn live_allocations(&self) -> usize {
        self.live
    }

    /// Allocates `size` bytes at the first free span that fits after alignment.
    ///
    /// # Returns
    ///
    /// `None` when no span can hold the request or when `size` is zero.
    pub fn allocate(&mut self, size: u64, alignment: u64) -> Option<PoolBlock> {
        if size == 0 {
            return None;
        }
        let alignment = alignment.max(self.min_alignment);

        let (index, offset) = self.spans.iter().enumerate().find_map(|(i, span)| {
            if span.allocated {
                return None;
            }
            let offset = align_up(span.begin, alignment);
            (offset + size <= span.end).then_some((i, offset))
        })?;

        let mut index = index;
        let end = offset + size;

        // The original span keeps the alignment hole.
        if offset > self.spans[index].begin {
            let span_end = self.spans[index].end;
            self.spans[index].end = offset;
            self.spans.insert(
                index + 1,
                Span {
                    begin: offset,
                    end: span_end,
                    allocated: false,
                },
            );
            index += 1;
        }

        if end < self.spans[index].end {
            let span_end = self.spans[index].end;
            self.spans[index].end = end;
            self.spans.insert(
                index + 1,
                Span {
                    begin: end,
                    end: span_end,
                    allocated: false,
                },
            );
        }

        self.spans[index].allocated = true;
        self.live += 1;
        Some(PoolBlock { offset, size })
    }

    /// Releases a block previously returned by [`allocate`](Self::allocate).
    ///
    /// # Returns
    ///
    /// `false` if the block is not a live allocation of this pool.
    pub fn free(&mut self, block: PoolBlock) -> bool {
        let index = self.spans.partition_point(|s| s.begin < block.offset);
        match self.spans.get(index) {
            Some(span) if span.begin == block.offset && span.allocated => {}
            _ => return false,
        }

        self.spans[index].allocated = false;
        self.live -= 1;

        if index + 1 < self.spans.len() && !self.spans[index + 1].allocated {
            self.spans[index].end = self.spans[index + 1].end;
            self.spans.remove(index + 1);
        }
        if index > 0 && !self.spans[index - 1].allocated {
            self.spans[index - 1].end = self.spans[index].end;
            self.spans.remove(index);
        }
        true
    }

    /// Number of bytes not covered by a live allocation.
    pub fn free_bytes(&self) -> u64 {
        self.spans
            .iter()
            .filter(|s| !s.allocated)
            .map(|s| s.end - s.begin)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_reuse_middle() {
        let mut pool = FirstFitPool::new(1000, 5, 1);
        let b1 = pool.allocate(700, 1).unwrap();
        let b2 = pool.allocate(200, 1).unwrap();
        let b3 = pool.allocate(100, 1).unwrap();
        assert_eq!((b1.offset, b2.offset, b3.offset), (0, 700, 900));
        assert_eq!(pool.free_bytes(), 0);

        assert!(pool.free(b2));
        let b2 = pool.allocate(150, 1).unwrap();
        assert_eq!(b2.offset, 700);

        assert!(pool.free(b1));
        let b1 = pool.allocate(650, 1).unwrap();
        assert_eq!(b1.offset, 0);

        assert!(pool.free(b3));
        let b3 = pool.allocate(80, 1).unwrap();
        assert_eq!(b3.offset, 850);

        assert!(pool.free(b1));
        assert!(pool.free(b2));
        assert!(pool.free(b3));
        let whole = pool.allocate(1000, 1).unwrap();
        assert_eq!(whole, PoolBlock { offset: 0, size: 1000 });
    }

    #[test]
    fn test_coalesces_out_of_order_frees() {
        let mut pool = FirstFitPool::new(1000, 5, 1);
        let blocks: Vec<_> = (0..10).map(|_| pool.allocate(100, 1).unwrap()).collect();
        for (i, b) in blocks.iter().enumerate() {
            assert_eq!(b.offset, 100 * i as u64);
        }
        assert!(pool.allocate(100, 1).is_none());

        pool.free(blocks[2]);
        pool.free(blocks[4]);
        pool.free(blocks[3]);
        let mid = pool.allocate(300, 1).unwrap();
        assert_eq!(mid.offset, 200);

        pool.free(blocks[7]);
        pool.free(blocks[6]);
        pool.free(blocks[5]);
        let upper = pool.allocate(300, 1).unwrap();
        assert_eq!(upper.offset, 500);

        pool.free(upper);
        pool.free(blocks[8]);
        pool.free(blocks[9]);
        pool.free(mid);
        let big = pool.allocate(800, 1).unwrap();
        assert_eq!(big.offset, 200);

        pool.free(blocks[0]);
        pool.free(blocks[1]);
        pool.free(big);
        assert_eq!(pool.allocate(1000, 1).unwrap().offset, 0);
    }

    #[test]
    fn test_alignment_holes() {
        let mut pool = FirstFitPool::new(1000, 5, 1);
        assert_eq!(pool.allocate(5, 1).unwrap().offset, 0);
        assert_eq!(pool.allocate(19, 4).unwrap().offset, 8);
        assert_eq!(pool.allocate(39, 16).unwrap().offset, 32);
        let b3 = pool.allocate(200, 128).unwrap();
        assert_eq!(b3.offset, 128);
        assert_eq!(pool.allocate(488, 512).unwrap().offset, 512);
        assert!(pool.allocate(200, 256).is_none());

        pool.free(b3);
        assert_eq!(pool.allocate(200, 256).unwrap().offset, 256);
    }

    #[test]
    fn test_min_alignment_applies() {
        let mut pool = FirstFitPool::new(4096, 4, 256);
        let a = pool.allocate(10, 1).unwrap();
        let b = pool.allocate(10, 1).unwrap();
        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 256);
    }

    #[test]
    fn test_rejects_unknown_and_double_free() {
        let mut pool = FirstFitPool::new(100, 1, 1);
        let a = pool.allocate(10, 1).unwrap();
        assert!(!pool.free(PoolBlock { offset: 5, size: 10 }));
        assert!(pool.free(a));
        assert!(!pool.free(a));
        assert_eq!(pool.live_allocations(), 0);
        assert!(pool.allocate(0, 1).is_none());
    }
}
