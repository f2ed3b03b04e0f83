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

use crate::renderer::error::ResourceError;
use std::fmt::Debug;
use std::time::Duration;

/// Outcome of waiting on a frame fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The GPU finished the work of that slot.
    Signaled,
    /// The timeout elapsed first.
    TimedOut,
}

/// Per-slot completion fences of the frames in flight.
pub trait FrameFence: Send + Sync + Debug {
    /// Blocks until the work previously submitted in `slot` completes or `timeout` elapses.
    fn wait(&self, slot: usize, timeout: Duration) -> Result<FenceStatus, ResourceError>;
}
