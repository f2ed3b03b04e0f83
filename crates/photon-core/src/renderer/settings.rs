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

//! Tunables for the lighting and acceleration pipelines.
//!
//! Every field has a default, so a settings file only needs to name what it
//! changes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether dynamic bottom-level structures may be refitted in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefitPolicy {
    /// Every dynamic object is rebuilt from scratch each frame.
    #[default]
    AlwaysRebuild,
    /// Dynamic objects are refitted when the device reports support.
    RefitWhenSupported,
}

/// Light registry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// Radius given to lights that do not specify one.
    pub default_radius: f32,
    /// Multiplier applied to static light colors.
    pub attenuation: f32,
    /// Minimum seconds between two repeated overflow diagnostics.
    pub throttle_interval_secs: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            default_radius: 2.0,
            attenuation: 0.1,
            throttle_interval_secs: 10.0,
        }
    }
}

impl LightSettings {
    /// The throttle interval as a [`Duration`].
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_secs_f32(self.throttle_interval_secs.max(0.0))
    }
}

/// Acceleration builder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelSettings {
    /// Scratch arena size in bytes.
    pub scratch_budget: u64,
    /// Storage pool size in bytes.
    pub storage_budget: u64,
    /// Alignment of every pooled structure.
    pub storage_alignment: u64,
    /// Capacity hint for the storage pool.
    pub expected_accels: usize,
    /// Top-level instances per frame.
    pub max_instances: u32,
    /// Refit behavior for dynamic objects.
    pub refit: RefitPolicy,
}

impl Default for AccelSettings {
    fn default() -> Self {
        Self {
            scratch_budget: 32 * 1024 * 1024,
            storage_budget: 64 * 1024 * 1024,
            storage_alignment: 256,
            expected_accels: 512,
            max_instances: 4096,
            refit: RefitPolicy::AlwaysRebuild,
        }
    }
}

/// Frame pacing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Upper bound on the wait for a frame slot's fence.
    pub fence_timeout_ms: u64,
    /// Number of frame slots cycled through.
    pub frames_in_flight: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fence_timeout_ms: 10_000,
            frames_in_flight: 2,
        }
    }
}

impl FrameSettings {
    /// The fence timeout as a [`Duration`].
    pub fn fence_timeout(&self) -> Duration {
        Duration::from_millis(self.fence_timeout_ms)
    }
}

/// All ray-tracing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayTracingSettings {
    /// Light registry settings.
    pub lights: LightSettings,
    /// Acceleration builder settings.
    pub accel: AccelSettings,
    /// Frame pacing settings.
    pub frame: FrameSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = RayTracingSettings::default();
        assert_eq!(s.accel.refit, RefitPolicy::AlwaysRebuild);
        assert_eq!(s.accel.scratch_budget, 32 << 20);
        assert_eq!(s.frame.fence_timeout(), Duration::from_secs(10));
        assert_eq!(s.lights.throttle_interval(), Duration::from_secs(10));
    }
}
