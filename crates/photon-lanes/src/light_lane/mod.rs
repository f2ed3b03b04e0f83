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

//! Lighting lane: which lights reach which part of the map.
//!
//! - [`LightRegistry`]: static and per-frame lights and emissive polygons.
//! - [`VisibilityCache`]: leaves that can see a surface or a point.
//! - [`LightGrid`]: world-space cells listing the lights that reach them.
//! - [`LightUploader`]: copies the registry and the changed cells to the GPU.
//! - [`EmissiveTable`]: texture emission read from `.rad` annotation files.

mod dump;
mod emissive;
mod error;
mod grid;
mod light;
mod registry;
mod uploader;
mod visibility;

pub use self::dump::{DumpEntry, DumpKind};
pub use self::emissive::{
    map_annotation_path, parse_line, EmissiveEntry, EmissiveTable, RadLine, EMISSIVE_SCALE,
    GLOBAL_ANNOTATIONS,
};
pub use self::error::{AnnotationError, LightError, RegistryPhase};
pub use self::grid::{
    leaf_cell_range, CellInserter, CellSlot, GridCell, GridDimensions, InsertReport, LightGrid,
};
pub use self::light::{
    DynamicLight, LightDescriptor, LightKind, PointLight, PolygonDescriptor, PolygonLight,
    PolygonSource,
};
pub use self::registry::{LightDiagnostics, LightFrameStats, LightRegistry, StaticCounts};
pub use self::uploader::{LightUploader, STAGING_ALIGNMENT};
pub use self::visibility::{LeafAccumulator, VisibilityCache, VisibleLeafSet};
