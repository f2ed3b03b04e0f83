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

use crate::renderer::api::AccelId;
use crate::renderer::clustering::LightBindings;
use crate::renderer::error::RenderError;
use std::fmt::Debug;

/// The consumer of a frame's acceleration structure and light data.
///
/// Typically the ray dispatch plus the pass that presents its image.
pub trait RayOutput: Debug {
    /// Traces the frame against `tlas` with the given light bindings.
    fn trace(&mut self, tlas: AccelId, lights: &LightBindings) -> Result<(), RenderError>;

    /// Clears the output and forwards the previous image, used when there
    /// is nothing to trace.
    fn forward_previous(&mut self) -> Result<(), RenderError>;
}
