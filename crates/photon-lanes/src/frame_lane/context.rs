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

//! The per-renderer context that runs a ray-traced frame.
//!
//! # Frame order
//!
//! 1. [`begin_frame`](RtContext::begin_frame) waits for the frame slot about
//!    to be reused, then rewinds the lights and resets the builder.
//! 2. The host adds dynamic lights through [`lights_mut`](RtContext::lights_mut)
//!    and builds objects and instances through [`accel_mut`](RtContext::accel_mut).
//! 3. [`end_frame`](RtContext::end_frame) finishes the light list, uploads it,
//!    builds the top level and hands both to the ray output.

use super::metrics::RtMetrics;
use crate::accel_lane::{AccelBuilder, AccelStats, TopLevel, TransformHistory};
use crate::light_lane::{LightFrameStats, LightRegistry, LightUploader};
use photon_core::io::TextSource;
use photon_core::renderer::api::BufferId;
use photon_core::renderer::{
    AccelerationDevice, FenceStatus, FrameFence, RayOutput, RayTracingSettings, RenderError,
    TransferChannel,
};
use photon_core::spatial::SpatialMap;
use std::sync::Arc;

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Index of the frame, counting from zero.
    pub frame_index: u64,
    /// Light counts and dirty cells.
    pub lights: LightFrameStats,
    /// Cell runs copied to the GPU.
    pub ranges_uploaded: usize,
    /// Outcome of the top-level build.
    pub top_level: TopLevel,
    /// Acceleration counters.
    pub accel: AccelStats,
}

/// Owns every lighting and acceleration structure of one renderer.
#[derive(Debug)]
pub struct RtContext {
    settings: RayTracingSettings,
    lights: LightRegistry,
    uploader: LightUploader,
    accel: AccelBuilder,
    history: TransformHistory,
    metrics: Option<RtMetrics>,
    frame_index: u64,
}

impl RtContext {
    /// Creates a context uploading lights into `light_buffer`.
    pub fn new(settings: RayTracingSettings, light_buffer: BufferId) -> Self {
        let throttle = settings.lights.throttle_interval();
        Self {
            lights: LightRegistry::new(settings.lights.clone()),
            uploader: LightUploader::new(light_buffer),
            accel: AccelBuilder::new(settings.accel.clone(), throttle),
            history: TransformHistory::new(),
            metrics: None,
            frame_index: 0,
            settings,
        }
    }

    /// Publishes frame counters to `metrics` at the end of every frame.
    pub fn with_metrics(mut self, metrics: RtMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Starts loading a map: resets the lights and recreates every
    /// acceleration structure.
    ///
    /// Static lights and polygons go through [`lights_mut`](Self::lights_mut)
    /// afterwards, followed by [`finish_map_load`](Self::finish_map_load).
    pub fn load_map(
        &mut self,
        map: Arc<dyn SpatialMap>,
        annotations: &dyn TextSource,
        device: &dyn AccelerationDevice,
    ) -> Result<(), RenderError> {
        log::info!("RtContext: loading {}", map.name());
        self.lights.begin_map_load(map, annotations)?;
        self.accel.new_map(device)?;
        self.history.clear();
        Ok(())
    }

    /// Freezes the static lights of the map being loaded.
    pub fn finish_map_load(&mut self) -> Result<(), RenderError> {
        self.lights.end_map_load()?;
        Ok(())
    }

    /// Waits for the frame slot and resets per-frame state.
    ///
    /// A fence that does not signal within the configured timeout fails
    /// with [`RenderError::DeviceTimeout`].
    pub fn begin_frame(&mut self, fence: &dyn FrameFence) -> Result<(), RenderError> {
        let frames = u64::from(self.settings.frame.frames_in_flight.max(1));
        let slot = (self.frame_index % frames) as usize;
        let timeout = self.settings.frame.fence_timeout();
        match fence.wait(slot, timeout)? {
            FenceStatus::Signaled => {}
            FenceStatus::TimedOut => {
                log::error!(
                    "RtContext: frame slot {slot} not signaled after {} ms",
                    timeout.as_millis()
                );
                return Err(RenderError::DeviceTimeout { waited: timeout });
            }
        }
        self.lights.begin_frame()?;
        self.accel.begin_frame();
        Ok(())
    }

    /// Uploads the lights, builds the top level and traces.
    ///
    /// Without instances nothing is traced and the output forwards the
    /// previous image.
    pub fn end_frame(
        &mut self,
        channel: &mut dyn TransferChannel,
        device: &dyn AccelerationDevice,
        output: &mut dyn RayOutput,
    ) -> Result<FrameReport, RenderError> {
        let lights = self.lights.end_frame();
        let bindings = self.uploader.upload(&mut self.lights, channel)?;

        let top_level = match self.accel.build_top_level(device) {
            Ok(top_level) => top_level,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                log::warn!("RtContext: top level skipped: {err}");
                TopLevel::Skipped
            }
        };
        match top_level {
            TopLevel::Built(tlas) => output.trace(tlas, &bindings)?,
            TopLevel::Skipped => output.forward_previous()?,
        }
        self.history.end_frame();

        let report = FrameReport {
            frame_index: self.frame_index,
            lights,
            ranges_uploaded: self.uploader.last_ranges().len(),
            top_level,
            accel: self.accel.stats(),
        };
        if let Some(metrics) = &self.metrics {
            metrics.publish(&report);
        }
        self.frame_index += 1;
        Ok(report)
    }

    /// Settings in use.
    pub fn settings(&self) -> &RayTracingSettings {
        &self.settings
    }

    /// Index of the next frame to end.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The light registry.
    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    /// The light registry, for adding lights.
    pub fn lights_mut(&mut self) -> &mut LightRegistry {
        &mut self.lights
    }

    /// The light uploader.
    pub fn uploader(&self) -> &LightUploader {
        &self.uploader
    }

    /// The acceleration builder.
    pub fn accel(&self) -> &AccelBuilder {
        &self.accel
    }

    /// The acceleration builder, for building objects and adding instances.
    pub fn accel_mut(&mut self) -> &mut AccelBuilder {
        &mut self.accel
    }

    /// The transform history.
    pub fn history(&self) -> &TransformHistory {
        &self.history
    }

    /// The transform history, for recording this frame's transforms.
    pub fn history_mut(&mut self) -> &mut TransformHistory {
        &mut self.history
    }
}
