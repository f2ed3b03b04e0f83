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

use crate::renderer::api::{StagingHandle, StagingRegion, StagingRequest};
use crate::renderer::error::ResourceError;

/// A CPU-to-GPU upload path.
///
/// Each locked region must be unlocked before the next one is requested;
/// the borrow on the returned region enforces this.
pub trait TransferChannel {
    /// Locks `request.size` bytes of staging memory destined for
    /// `request.buffer` at `request.offset`.
    /// ## Errors
    /// * `ResourceError::ChannelExhausted` - If the channel has no space left this frame.
    fn lock_region(&mut self, request: StagingRequest) -> Result<StagingRegion<'_>, ResourceError>;

    /// Submits a previously locked region for transfer.
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If the handle is not currently locked.
    fn unlock(&mut self, handle: StagingHandle) -> Result<(), ResourceError>;
}
