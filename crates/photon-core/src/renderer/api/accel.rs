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

//! Defines the descriptors exchanged with an [`AccelerationDevice`].
//!
//! [`AccelerationDevice`]: crate::renderer::traits::AccelerationDevice

use super::buffer::BufferId;
use crate::math::RowTransform;
use bytemuck::{Pod, Zeroable};
use std::ops::BitOr;

/// An opaque handle to an acceleration structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccelId(pub usize);

/// A GPU virtual address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct DeviceAddress(pub u64);

impl DeviceAddress {
    /// Offsets the address by `bytes`.
    #[inline]
    pub const fn offset(self, bytes: u64) -> Self {
        Self(self.0 + bytes)
    }
}

/// The level of an acceleration structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccelKind {
    /// Triangles of a single object.
    BottomLevel,
    /// Instances of bottom-level structures.
    TopLevel,
}

/// Whether a build starts from nothing or refits an existing structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    /// Full build into the destination.
    Build,
    /// Refit of the source into the destination.
    Update,
}

/// A run of indexed triangles inside a vertex/index buffer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleGeometry {
    /// Buffer holding the vertices and indices.
    pub buffer: BufferId,
    /// Byte offset of the first vertex.
    pub vertex_offset: u64,
    /// Bytes between two vertices.
    pub vertex_stride: u64,
    /// Highest vertex index referenced.
    pub max_vertex: u32,
    /// Byte offset of the first index, `None` for non-indexed triangles.
    pub index_offset: Option<u64>,
    /// Number of triangles.
    pub primitive_count: u32,
}

/// What an acceleration structure is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccelGeometry {
    /// Bottom level: one or more triangle runs.
    Triangles(Vec<TriangleGeometry>),
    /// Top level: `count` instance descriptors starting at slot `first` of
    /// the device's instance region.
    Instances {
        /// First instance slot.
        first: u32,
        /// Number of instances.
        count: u32,
    },
}

impl AccelGeometry {
    /// The structure level this geometry builds.
    pub fn kind(&self) -> AccelKind {
        match self {
            AccelGeometry::Triangles(_) => AccelKind::BottomLevel,
            AccelGeometry::Instances { .. } => AccelKind::TopLevel,
        }
    }

    /// Total primitives (triangles or instances).
    pub fn primitive_count(&self) -> u64 {
        match self {
            AccelGeometry::Triangles(runs) => {
                runs.iter().map(|r| u64::from(r.primitive_count)).sum()
            }
            AccelGeometry::Instances { count, .. } => u64::from(*count),
        }
    }
}

/// Memory requirements reported by the device for a given geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccelBuildSizes {
    /// Bytes of storage the structure occupies.
    pub accel_size: u64,
    /// Scratch bytes for a full build.
    pub build_scratch_size: u64,
    /// Scratch bytes for a refit.
    pub update_scratch_size: u64,
}

impl AccelBuildSizes {
    /// Scratch bytes needed for `mode`.
    pub fn scratch_for(&self, mode: BuildMode) -> u64 {
        match mode {
            BuildMode::Build => self.build_scratch_size,
            BuildMode::Update => self.update_scratch_size,
        }
    }
}

/// Places a new acceleration structure inside the pooled storage buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelCreateDescriptor {
    /// Structure level.
    pub kind: AccelKind,
    /// Byte offset inside the storage buffer.
    pub storage_offset: u64,
    /// Bytes reserved for the structure.
    pub size: u64,
}

/// One build recorded into the frame's command stream.
#[derive(Debug, Clone, Copy)]
pub struct AccelBuildCommand<'a> {
    /// Full build or refit.
    pub mode: BuildMode,
    /// Geometry to build from.
    pub geometry: &'a AccelGeometry,
    /// Structure written by the build.
    pub dst: AccelId,
    /// Structure read by a refit; equal to `dst` for in-place updates.
    pub src: Option<AccelId>,
    /// Scratch memory for the build.
    pub scratch: DeviceAddress,
}

/// Per-instance flags, using the values shared by the common ray-tracing APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InstanceFlags(u8);

impl InstanceFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Disable back-face culling.
    pub const TRIANGLE_CULL_DISABLE: Self = Self(0x1);
    /// Invert the front-face winding.
    pub const TRIANGLE_FLIP_FACING: Self = Self(0x2);
    /// Treat every geometry as opaque; any-hit shaders are skipped.
    pub const FORCE_OPAQUE: Self = Self(0x4);
    /// Treat every geometry as non-opaque; any-hit shaders run.
    pub const FORCE_NO_OPAQUE: Self = Self(0x8);

    /// Raw bit value.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if all flags of `other` are set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for InstanceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A top-level instance descriptor in the layout the device consumes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuInstance {
    /// Object-to-world transform, row major.
    pub transform: [[f32; 4]; 3],
    /// Custom index in the low 24 bits, visibility mask in the high 8.
    pub custom_index_and_mask: u32,
    /// Hit-group offset in the low 24 bits, [`InstanceFlags`] in the high 8.
    pub sbt_offset_and_flags: u32,
    /// Device address of the bottom-level structure.
    pub accel_reference: u64,
}

impl GpuInstance {
    const LOW_24: u32 = 0x00ff_ffff;

    /// Packs an instance descriptor. Values wider than their field are truncated.
    pub fn new(
        transform: &RowTransform,
        custom_index: u32,
        mask: u8,
        sbt_offset: u32,
        flags: InstanceFlags,
        accel: DeviceAddress,
    ) -> Self {
        Self {
            transform: transform.0,
            custom_index_and_mask: (custom_index & Self::LOW_24) | (u32::from(mask) << 24),
            sbt_offset_and_flags: (sbt_offset & Self::LOW_24) | (u32::from(flags.bits()) << 24),
            accel_reference: accel.0,
        }
    }

    /// The custom index field.
    pub fn custom_index(&self) -> u32 {
        self.custom_index_and_mask & Self::LOW_24
    }

    /// The visibility mask field.
    pub fn mask(&self) -> u8 {
        (self.custom_index_and_mask >> 24) as u8
    }

    /// The hit-group offset field.
    pub fn sbt_offset(&self) -> u32 {
        self.sbt_offset_and_flags & Self::LOW_24
    }

    /// The flags field.
    pub fn flags(&self) -> InstanceFlags {
        InstanceFlags((self.sbt_offset_and_flags >> 24) as u8)
    }
}
