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

//! Provides the backend-agnostic contracts of the ray-tracing renderer.
//!
//! This module defines the 'what': GPU-facing layouts of the light grid,
//! acceleration-structure descriptors, the traits a backend implements, and
//! the error types crossing that boundary. The pipelines in `photon-lanes`
//! drive these traits without knowing which graphics API sits behind them.

pub mod api;
pub mod clustering;
pub mod error;
pub mod settings;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::clustering::{GpuLightCluster, GpuPointLight, GpuPolygonLight, LightBindings, LightsMetadata};
pub use self::error::{RenderError, ResourceError};
pub use self::settings::{
    AccelSettings, FrameSettings, LightSettings, RayTracingSettings, RefitPolicy,
};
pub use self::traits::{AccelerationDevice, FenceStatus, FrameFence, RayOutput, TransferChannel};
