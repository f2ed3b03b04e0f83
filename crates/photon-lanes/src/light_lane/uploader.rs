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

//! Copies the frame's lights and the changed grid cells to the GPU.
//!
//! The metadata block (grid extent, polygons, vertices, point lights) is
//! rewritten every frame. Grid cells are copied only when stamped with the
//! current frame sequence, one staging write per run of consecutive dirty
//! cells. Each upload ends by advancing the sequence.

use super::registry::LightRegistry;
use photon_core::math::Vec4;
use photon_core::renderer::api::{BufferId, StagingRequest};
use photon_core::renderer::clustering::{GpuLightCluster, LightBindings, LightsMetadata};
use photon_core::renderer::{RenderError, ResourceError, TransferChannel};
use std::ops::Range;

/// Alignment of every staging request.
pub const STAGING_ALIGNMENT: u64 = 16;

/// Uploads light data into one device buffer laid out as [`LightBindings`].
#[derive(Debug)]
pub struct LightUploader {
    bindings: LightBindings,
    metadata: Box<LightsMetadata>,
    last_ranges: Vec<Range<usize>>,
}

impl LightUploader {
    /// Creates an uploader writing into `buffer`, which must hold
    /// [`LightBindings::TOTAL_SIZE`] bytes.
    pub fn new(buffer: BufferId) -> Self {
        Self {
            bindings: LightBindings::new(buffer),
            metadata: LightsMetadata::new_boxed(),
            last_ranges: Vec::new(),
        }
    }

    /// Where the shaders find the light data.
    pub fn bindings(&self) -> LightBindings {
        self.bindings
    }

    /// Cell runs written by the last upload.
    pub fn last_ranges(&self) -> &[Range<usize>] {
        &self.last_ranges
    }

    /// Writes the metadata and every dirty cell run, then advances the frame
    /// sequence.
    pub fn upload(
        &mut self,
        registry: &mut LightRegistry,
        channel: &mut dyn TransferChannel,
    ) -> Result<LightBindings, RenderError> {
        self.last_ranges.clear();
        self.fill_metadata(registry)?;
        let bytes = bytemuck::bytes_of(&*self.metadata);
        let request = self.request(self.bindings.metadata.offset, bytes.len() as u64);
        write_region(channel, request, |data| data.copy_from_slice(bytes))?;

        let grid = registry.grid_mut().ok_or(RenderError::NotInitialized)?;
        let runs = grid.dirty_runs();
        for run in &runs {
            let cells = &grid.cells()[run.clone()];
            let request = self.request(
                self.bindings.cluster_offset(run.start),
                cells.len() as u64 * LightBindings::CLUSTER_SIZE,
            );
            write_region(channel, request, |data| {
                data.fill(0);
                let clusters: &mut [GpuLightCluster] = bytemuck::cast_slice_mut(data);
                for (cell, out) in cells.iter().zip(clusters) {
                    cell.write_gpu(out);
                }
            })?;
        }
        log::trace!(
            "LightUploader: {} dirty runs at sequence {}",
            runs.len(),
            grid.frame_sequence()
        );
        grid.advance_sequence();
        self.last_ranges = runs;
        Ok(self.bindings)
    }

    fn request(&self, offset: u64, size: u64) -> StagingRequest {
        StagingRequest {
            buffer: self.bindings.buffer,
            offset,
            size,
            alignment: STAGING_ALIGNMENT,
        }
    }

    fn fill_metadata(&mut self, registry: &LightRegistry) -> Result<(), RenderError> {
        let grid = registry.grid().ok_or(RenderError::NotInitialized)?;
        let meta = &mut *self.metadata;
        bytemuck::bytes_of_mut(meta).fill(0);

        let dims = grid.dimensions();
        meta.grid_min_cell = dims.min_cell;
        meta.grid_size = dims.size;

        let polygons = registry.polygons();
        meta.num_polygons = polygons.len().min(meta.polygons.len()) as u32;
        for (out, poly) in meta.polygons.iter_mut().zip(polygons) {
            *out = poly.to_gpu();
        }
        for (out, v) in meta.polygon_vertices.iter_mut().zip(registry.polygon_vertices()) {
            *out = Vec4::from_vec3(*v, 0.0).to_array();
        }

        let lights = registry.point_lights();
        meta.num_point_lights = lights.len().min(meta.point_lights.len()) as u32;
        for (out, light) in meta.point_lights.iter_mut().zip(lights) {
            *out = light.to_gpu();
        }
        Ok(())
    }
}

fn write_region(
    channel: &mut dyn TransferChannel,
    request: StagingRequest,
    fill: impl FnOnce(&mut [u8]),
) -> Result<(), RenderError> {
    let region = channel.lock_region(request).map_err(|err| match err {
        ResourceError::ChannelExhausted { requested } => {
            log::error!(
                "LightUploader: no staging space for {requested} bytes at offset {}",
                request.offset
            );
            RenderError::TransferChannelExhausted { requested }
        }
        other => RenderError::ResourceError(other),
    })?;
    let handle = region.handle;
    let len = region.data.len() as u64;
    if len != request.size {
        channel.unlock(handle)?;
        return Err(RenderError::Internal(format!(
            "staging region holds {len} bytes, {} requested",
            request.size
        )));
    }
    fill(region.data);
    channel.unlock(handle)?;
    Ok(())
}
