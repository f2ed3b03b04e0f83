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

//! Staging requests and regions used by a [`TransferChannel`].
//!
//! [`TransferChannel`]: crate::renderer::traits::TransferChannel

use super::buffer::BufferId;

/// Asks a transfer channel for CPU-writable memory that will land at
/// `offset` in `buffer` once unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingRequest {
    /// Destination buffer.
    pub buffer: BufferId,
    /// Destination byte offset.
    pub offset: u64,
    /// Bytes to write.
    pub size: u64,
    /// Required alignment of the staging memory.
    pub alignment: u64,
}

/// Identifies a locked staging region until it is unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingHandle(pub usize);

/// A locked staging region. `data.len()` equals the requested size.
#[derive(Debug)]
pub struct StagingRegion<'a> {
    /// Handle to pass to `unlock`.
    pub handle: StagingHandle,
    /// Writable bytes.
    pub data: &'a mut [u8],
}
