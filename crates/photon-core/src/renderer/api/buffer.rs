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

//! Defines data structures related to GPU buffer resources.

/// An opaque handle to a GPU buffer resource.
///
/// The backend hands these out; the lighting core only passes them back in
/// staging requests and bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// A byte range within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferSlice {
    /// Offset of the first byte.
    pub offset: u64,
    /// Length in bytes.
    pub size: u64,
}

impl BufferSlice {
    /// One past the last byte.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Returns `true` when `other` lies entirely inside this slice.
    pub fn contains(&self, other: &BufferSlice) -> bool {
        other.offset >= self.offset && other.end() <= self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_contains() {
        let outer = BufferSlice {
            offset: 16,
            size: 64,
        };
        assert!(outer.contains(&BufferSlice {
            offset: 16,
            size: 64
        }));
        assert!(outer.contains(&BufferSlice {
            offset: 40,
            size: 8
        }));
        assert!(!outer.contains(&BufferSlice {
            offset: 72,
            size: 16
        }));
    }
}
