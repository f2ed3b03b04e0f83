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

//! Frame-scoped scratch memory for acceleration builds.

use super::error::AccelError;
use photon_core::math::align_up;

/// A linear allocator over the device scratch buffer, reset every frame.
#[derive(Debug, Clone)]
pub struct ScratchArena {
    budget: u64,
    alignment: u64,
    offset: u64,
}

impl ScratchArena {
    /// Creates an arena of `budget` bytes whose allocations start on
    /// multiples of `alignment`.
    pub fn new(budget: u64, alignment: u64) -> Self {
        Self {
            budget,
            alignment: alignment.max(1),
            offset: 0,
        }
    }

    /// Forgets every allocation.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Bytes left.
    pub fn available(&self) -> u64 {
        self.budget.saturating_sub(self.offset)
    }

    /// Bytes used so far, alignment padding included.
    pub fn used(&self) -> u64 {
        self.offset
    }

    /// Fails unless `size` bytes fit.
    pub fn check(&self, size: u64) -> Result<(), AccelError> {
        if size > self.available() {
            return Err(AccelError::ScratchExhausted {
                requested: size,
                available: self.available(),
            });
        }
        Ok(())
    }

    /// Allocates `size` bytes and returns their offset.
    pub fn allocate(&mut self, size: u64) -> Result<u64, AccelError> {
        self.check(size)?;
        let start = self.offset;
        self.offset = align_up(start + size, self.alignment);
        Ok(start)
    }
}
