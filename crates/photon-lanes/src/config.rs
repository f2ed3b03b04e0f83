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

//! Loading [`RayTracingSettings`] from RON.
//!
//! ```ron
//! (
//!     lights: (default_radius: 3.0),
//!     accel: (refit: RefitWhenSupported, max_instances: 2048),
//! )
//! ```
//!
//! Fields that are left out keep their defaults.

use anyhow::Context;
use photon_core::renderer::RayTracingSettings;
use std::path::Path;

/// Parses settings from RON text.
pub fn from_ron_str(text: &str) -> anyhow::Result<RayTracingSettings> {
    ron::from_str(text).context("failed to parse ray-tracing settings")
}

/// Reads and parses a RON settings file.
pub fn load_settings(path: impl AsRef<Path>) -> anyhow::Result<RayTracingSettings> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    let settings =
        from_ron_str(&text).with_context(|| format!("in settings file {}", path.display()))?;
    log::info!("Loaded ray-tracing settings from {}", path.display());
    Ok(settings)
}

/// Serializes settings back to pretty RON.
pub fn to_ron_string(settings: &RayTracingSettings) -> anyhow::Result<String> {
    let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
    ron::ser::to_string_pretty(settings, pretty).context("failed to serialize ray-tracing settings")
}
