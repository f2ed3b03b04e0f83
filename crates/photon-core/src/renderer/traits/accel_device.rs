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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The slice of a ray-tracing capable device used to build acceleration structures.
///
/// Structures live inside one storage buffer owned by the device; the caller
/// decides their placement through [`AccelCreateDescriptor::storage_offset`].
/// Scratch memory is a second device buffer addressed from zero.
pub trait AccelerationDevice: Send + Sync + Debug {
    /// Queries storage and scratch requirements for a geometry.
    /// ## Arguments
    /// * `geometry` - What the structure would be built from.
    /// * `allow_update` - Whether the structure must support later refits.
    /// ## Errors
    /// * `ResourceError` - If the device rejects the geometry.
    fn build_sizes(
        &self,
        geometry: &AccelGeometry,
        allow_update: bool,
    ) -> Result<AccelBuildSizes, ResourceError>;

    /// Creates a structure at the given place in the storage buffer.
    fn create_accel(&self, descriptor: &AccelCreateDescriptor) -> Result<AccelId, ResourceError>;

    /// Destroys a structure. Unknown ids are ignored.
    fn destroy_accel(&self, id: AccelId);

    /// Device address of a structure, as referenced by instance descriptors.
    fn accel_address(&self, id: AccelId) -> Result<DeviceAddress, ResourceError>;

    /// Base address of the scratch buffer.
    fn scratch_base(&self) -> DeviceAddress;

    /// Records a build or refit into the current frame.
    fn record_build(&self, command: &AccelBuildCommand<'_>) -> Result<(), ResourceError>;

    /// Writes instance descriptors starting at slot `first` of the instance region.
    fn write_instances(&self, first: u32, instances: &[GpuInstance]) -> Result<(), ResourceError>;

    /// Alignment the device requires for scratch addresses.
    fn min_scratch_alignment(&self) -> u64;

    /// Whether bottom-level structures may be refitted.
    fn supports_refit(&self) -> bool;
}
