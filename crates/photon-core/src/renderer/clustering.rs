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

//! Capacities and GPU-facing layouts of the spatial light grid.
//!
//! Everything in this module is read by the ray-tracing shaders. The structs
//! are `#[repr(C)]` and [`Pod`], so they can be copied into a staging region
//! with `bytemuck` and nothing else. Changing a field or a capacity changes
//! the shader ABI.

use crate::renderer::api::{BufferId, BufferSlice};
use bytemuck::{Pod, Zeroable};

/// Edge length of a grid cell in world units.
pub const LIGHT_GRID_CELL_SIZE: f32 = 128.0;

/// Maximum number of cells a map's grid may have.
pub const MAX_LIGHT_CLUSTERS: usize = 262_144;

/// Point-light slots per cell.
pub const MAX_VISIBLE_POINT_LIGHTS: usize = 31;

/// Polygon-light slots per cell.
pub const MAX_VISIBLE_SURFACE_LIGHTS: usize = 255;

/// Point lights per frame, static and dynamic combined.
pub const MAX_POINT_LIGHTS: usize = 256;

/// Polygon lights per frame, static and dynamic combined.
///
/// Cells reference polygons with a `u8`, so at most 255 of them are ever
/// visible to the shaders.
pub const MAX_EMISSIVE_POLYGONS: usize = 256;

/// Largest polygon index a cell can encode.
pub const MAX_ADDRESSABLE_POLYGONS: usize = u8::MAX as usize;

/// Vertices a polygon light may have.
pub const MAX_VERTICES_PER_POLYGON: usize = 7;

/// Shared vertex pool size for polygon lights.
pub const MAX_POLYGON_VERTICES: usize = MAX_EMISSIVE_POLYGONS * MAX_VERTICES_PER_POLYGON;

/// A point, spot or environment light as seen by the shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// `xyz` origin, `w` radius.
    pub origin_r: [f32; 4],
    /// `rgb` color, `w` inner cone cosine.
    pub color_stopdot: [f32; 4],
    /// `xyz` direction, `w` outer cone cosine.
    pub dir_stopdot2: [f32; 4],
    /// Non-zero for environment lights.
    pub environment: u32,
    /// Padding to a 16-byte multiple.
    pub _pad: [u32; 3],
}

/// An emissive polygon as seen by the shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPolygonLight {
    /// Plane normal in `xyz` and distance in `w`.
    pub plane: [f32; 4],
    /// Vertex average.
    pub center: [f32; 3],
    /// Polygon area.
    pub area: f32,
    /// Emitted color.
    pub emissive: [f32; 3],
    /// `(count << 16) | offset` into [`LightsMetadata::polygon_vertices`].
    pub vertices_count_offset: u32,
}

impl GpuPolygonLight {
    /// Packs a vertex run the way the shaders unpack it.
    #[inline]
    pub const fn pack_vertices(offset: u32, count: u32) -> u32 {
        (count << 16) | (offset & 0xffff)
    }
}

/// One grid cell: the indices of lights that may reach it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLightCluster {
    /// Valid entries in `point_lights`.
    pub num_point_lights: u8,
    /// Valid entries in `polygons`.
    pub num_polygons: u8,
    /// Indices into [`LightsMetadata::point_lights`].
    pub point_lights: [u8; MAX_VISIBLE_POINT_LIGHTS],
    /// Indices into [`LightsMetadata::polygons`].
    pub polygons: [u8; MAX_VISIBLE_SURFACE_LIGHTS],
}

impl Default for GpuLightCluster {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// The header block of the light buffer.
///
/// At roughly 40 KiB it should be built on the heap with
/// [`LightsMetadata::new_boxed`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsMetadata {
    /// Grid origin, in cells.
    pub grid_min_cell: [i32; 3],
    /// Polygon lights in use.
    pub num_polygons: u32,
    /// Grid dimensions, in cells.
    pub grid_size: [i32; 3],
    /// Point lights in use.
    pub num_point_lights: u32,
    /// Polygon lights.
    pub polygons: [GpuPolygonLight; MAX_EMISSIVE_POLYGONS],
    /// Vertex pool referenced by the polygons, `w` unused.
    pub polygon_vertices: [[f32; 4]; MAX_POLYGON_VERTICES],
    /// Point lights.
    pub point_lights: [GpuPointLight; MAX_POINT_LIGHTS],
}

impl LightsMetadata {
    /// Allocates a zeroed header directly on the heap.
    pub fn new_boxed() -> Box<Self> {
        bytemuck::zeroed_box()
    }
}

/// Where the header and the cell array live inside the light buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightBindings {
    /// The buffer holding both blocks.
    pub buffer: BufferId,
    /// The [`LightsMetadata`] block.
    pub metadata: BufferSlice,
    /// The [`GpuLightCluster`] array.
    pub grid: BufferSlice,
}

impl LightBindings {
    /// Byte size of the header block.
    pub const METADATA_SIZE: u64 = std::mem::size_of::<LightsMetadata>() as u64;

    /// Byte size of one cell.
    pub const CLUSTER_SIZE: u64 = std::mem::size_of::<GpuLightCluster>() as u64;

    /// Byte size of the full cell array.
    pub const GRID_SIZE: u64 = Self::CLUSTER_SIZE * MAX_LIGHT_CLUSTERS as u64;

    /// Total bytes a light buffer must provide.
    pub const TOTAL_SIZE: u64 = Self::METADATA_SIZE + Self::GRID_SIZE;

    /// Standard layout: header first, cells right after it.
    pub fn new(buffer: BufferId) -> Self {
        Self {
            buffer,
            metadata: BufferSlice {
                offset: 0,
                size: Self::METADATA_SIZE,
            },
            grid: BufferSlice {
                offset: Self::METADATA_SIZE,
                size: Self::GRID_SIZE,
            },
        }
    }

    /// Byte offset of cell `index` within the buffer.
    #[inline]
    pub fn cluster_offset(&self, index: usize) -> u64 {
        self.grid.offset + index as u64 * Self::CLUSTER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn test_wire_sizes() {
        assert_eq!(size_of::<GpuPointLight>(), 64);
        assert_eq!(size_of::<GpuPolygonLight>(), 48);
        assert_eq!(size_of::<GpuLightCluster>(), 288);
        assert_eq!(align_of::<GpuLightCluster>(), 1);
        assert_eq!(
            size_of::<LightsMetadata>(),
            32 + 48 * MAX_EMISSIVE_POLYGONS + 16 * MAX_POLYGON_VERTICES + 64 * MAX_POINT_LIGHTS
        );
    }

    #[test]
    fn test_metadata_is_16_byte_multiple() {
        assert_eq!(size_of::<LightsMetadata>() % 16, 0);
    }

    #[test]
    fn test_bindings_layout() {
        let bindings = LightBindings::new(BufferId(7));
        assert_eq!(bindings.metadata.offset, 0);
        assert_eq!(bindings.grid.offset, LightBindings::METADATA_SIZE);
        assert_eq!(bindings.grid.size, 288 * 262_144);
        assert_eq!(
            bindings.cluster_offset(2),
            LightBindings::METADATA_SIZE + 576
        );
    }

    #[test]
    fn test_pack_vertices() {
        assert_eq!(GpuPolygonLight::pack_vertices(14, 4), (4 << 16) | 14);
    }

    #[test]
    fn test_boxed_metadata_is_zeroed() {
        let meta = LightsMetadata::new_boxed();
        assert_eq!(meta.num_point_lights, 0);
        assert!(meta.point_lights.iter().all(|l| *l == GpuPointLight::default()));
    }
}
