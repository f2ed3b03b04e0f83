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

//! Error types for the lighting lane.

use photon_core::renderer::RenderError;
use photon_core::spatial::SurfaceId;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle phase of a [`LightRegistry`](super::LightRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    /// No map has been loaded.
    Empty,
    /// Between `begin_map_load` and `end_map_load`.
    Loading,
    /// A map is loaded and frames may run.
    Ready,
}

/// Failure to register a light or to prepare the grid for a map.
#[derive(Debug, Error)]
pub enum LightError {
    /// All point-light slots are in use.
    #[error("Too many point lights (capacity {capacity})")]
    PointLightCapacity {
        /// Maximum number of point lights.
        capacity: usize,
    },

    /// All emissive polygon slots are in use.
    #[error("Too many emissive polygons (capacity {capacity})")]
    PolygonCapacity {
        /// Maximum number of emissive polygons.
        capacity: usize,
    },

    /// The shared polygon vertex array has no room for the polygon.
    #[error("Polygon vertex array full: {requested} more vertices requested, {available} available")]
    VertexCapacity {
        /// Vertices the polygon needs.
        requested: usize,
        /// Vertices still free.
        available: usize,
    },

    /// A polygon must have between 3 and 7 vertices.
    #[error("Emissive polygon has {count} vertices")]
    InvalidPolygon {
        /// Vertex count that was supplied.
        count: usize,
    },

    /// The polygon's vertices are collinear or coincident.
    #[error("Emissive polygon has zero area")]
    DegeneratePolygon,

    /// The surface does not exist in the loaded map.
    #[error("Surface {0:?} is not part of the loaded map")]
    UnsupportedSurface(SurfaceId),

    /// The map bounds need more grid cells than the grid can address.
    #[error("Map needs {cells} light grid cells, more than the {max} available")]
    GridTooLarge {
        /// Cells needed by the map bounds.
        cells: usize,
        /// Grid capacity.
        max: usize,
    },

    /// The operation is not valid in the registry's current phase.
    #[error("{operation} is not allowed while the registry is {phase:?}")]
    NotLoaded {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Phase the registry was in.
        phase: RegistryPhase,
    },
}

impl LightError {
    /// Capacity errors drop one light but leave the frame usable.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            LightError::PointLightCapacity { .. }
                | LightError::PolygonCapacity { .. }
                | LightError::VertexCapacity { .. }
        )
    }
}

impl From<LightError> for RenderError {
    fn from(err: LightError) -> Self {
        match err {
            LightError::NotLoaded { .. } => RenderError::NotInitialized,
            other => RenderError::RenderingFailed(other.to_string()),
        }
    }
}

/// Failure to read or interpret a light annotation (`.rad`) file.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The file exists but could not be read.
    #[error("Couldn't read light annotations from {path}: {source}")]
    Read {
        /// Path relative to the annotation root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line names a comment instead of a texture.
    #[error("{file}:{line}: skipping commented entry {name:?}")]
    Commented {
        /// File the line came from.
        file: String,
        /// One-based line number.
        line: usize,
        /// First token of the line.
        name: String,
    },

    /// A line does not carry 1, 3 or 4 numbers after the texture name.
    #[error("{file}:{line}: {name:?} has {count} values, expected 1, 3 or 4")]
    ValueCount {
        /// File the line came from.
        file: String,
        /// One-based line number.
        line: usize,
        /// Texture token of the line.
        name: String,
        /// Number of values that parsed.
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_classification() {
        assert!(LightError::PointLightCapacity { capacity: 256 }.is_capacity());
        assert!(!LightError::InvalidPolygon { count: 2 }.is_capacity());
    }

    #[test]
    fn test_not_loaded_maps_to_not_initialized() {
        let err = LightError::NotLoaded {
            operation: "begin_frame",
            phase: RegistryPhase::Empty,
        };
        assert_eq!(
            err.to_string(),
            "begin_frame is not allowed while the registry is Empty"
        );
        assert!(matches!(RenderError::from(err), RenderError::NotInitialized));
    }

    #[test]
    fn test_annotation_display() {
        let err = AnnotationError::ValueCount {
            file: "maps/lights.rad".into(),
            line: 3,
            name: "+0light".into(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "maps/lights.rad:3: \"+0light\" has 2 values, expected 1, 3 or 4"
        );
    }
}
