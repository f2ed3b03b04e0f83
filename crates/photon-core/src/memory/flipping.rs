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

//! A double-buffered linear allocator.

use crate::math::align_up;

/// Splits a region into two halves and allocates linearly from the active one.
///
/// Calling [`flip`](Self::flip) once per frame switches halves, so the
/// allocations of frame `N` stay untouched while frame `N + 1` writes into
/// the other half. Units are whatever the caller counts in (bytes, instance
/// slots, ...).
#[derive(Debug, Clone)]
pub struct FlippingBuffer {
    half: u32,
    active: u32,
    offset: u32,
}

impl FlippingBuffer {
    /// Creates a flipping buffer spanning `capacity` units in total.
    pub fn new(capacity: u32) -> Self {
        Self {
            half: capacity / 2,
            active: 0,
            offset: 0,
        }
    }

    /// Units available to a single frame.
    pub fn frame_capacity(&self) -> u32 {
        self.half
    }

    /// Index of the half currently being written, `0` or `1`.
    pub fn active_half(&self) -> u32 {
        self.active
    }

    /// Switches to the other half and forgets everything allocated there.
    pub fn flip(&mut self) {
        self.active ^= 1;
        self.offset = 0;
    }

    /// Resets to the first half with nothing allocated.
    pub fn clear(&mut self) {
        self.active = 0;
        self.offset = 0;
    }

    /// Allocates `count` units aligned to `alignment` from the active half.
    ///
    /// # Returns
    ///
    /// The absolute offset of the allocation, or `None` if the active half
    /// cannot hold it.
    pub fn alloc(&mut self, count: u32, alignment: u32) -> Option<u32> {
        let start = align_up(u64::from(self.offset), u64::from(alignment));
        let end = start + u64::from(count);
        if end > u64::from(self.half) {
            return None;
        }
        // `end` fits in the half, which itself fits in u32.
        self.offset = end as u32;
        Some(self.active * self.half + start as u32)
    }
}
