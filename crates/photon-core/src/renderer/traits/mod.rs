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

//! Defines the contracts between the lighting core and a graphics backend.
//!
//! - [`TransferChannel`]: Locks staging memory for buffer uploads.
//! - [`AccelerationDevice`]: Sizes, creates and builds acceleration structures.
//! - [`FrameFence`]: Waits for a frame slot to become reusable.
//! - [`RayOutput`]: Consumes the built scene and light bindings.

mod accel_device;
mod fence;
mod output;
mod transfer;

pub use self::accel_device::AccelerationDevice;
pub use self::fence::{FenceStatus, FrameFence};
pub use self::output::RayOutput;
pub use self::transfer::TransferChannel;
