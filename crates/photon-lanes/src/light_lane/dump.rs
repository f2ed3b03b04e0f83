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

//! Listing registered lights for debugging.

use super::grid::LightGrid;
use super::light::{LightKind, PointLight, PolygonLight};
use photon_core::math::Vec3;
use photon_core::renderer::clustering::{MAX_EMISSIVE_POLYGONS, MAX_POINT_LIGHTS};
use std::fmt;

/// What a dump line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    /// A point, spot or environment light.
    Light(LightKind),
    /// An emissive polygon.
    Polygon,
}

/// One line of a light dump.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpEntry {
    /// Index in the point-light or polygon array.
    pub index: usize,
    /// Kind of entry.
    pub kind: DumpKind,
    /// Label, if one was given.
    pub label: Option<String>,
    /// Origin of a light or center of a polygon.
    pub position: Vec3,
    /// Current color.
    pub color: Vec3,
    /// Radius of a light or area of a polygon.
    pub extent: f32,
    /// Number of grid cells listing this entry.
    pub cells: usize,
    /// Part of the map-load baseline.
    pub is_static: bool,
}

impl fmt::Display for DumpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DumpKind::Light(LightKind::Point) => "point",
            DumpKind::Light(LightKind::Spot) => "spot",
            DumpKind::Light(LightKind::Environment) => "environment",
            DumpKind::Polygon => "polygon",
        };
        let extent = match self.kind {
            DumpKind::Polygon => "area",
            DumpKind::Light(_) => "R",
        };
        write!(
            f,
            "{kind} {} [{}] {}: pos=({:.1} {:.1} {:.1}) {extent}={:.2} color=({:.2} {:.2} {:.2}) cells={}",
            self.index,
            if self.is_static { "static" } else { "dynamic" },
            self.label.as_deref().unwrap_or("-"),
            self.position.x,
            self.position.y,
            self.position.z,
            self.extent,
            self.color.x,
            self.color.y,
            self.color.z,
            self.cells
        )
    }
}

fn label_matches(label: Option<&str>, filter: Option<&str>) -> bool {
    match filter.filter(|f| !f.is_empty()) {
        None => true,
        Some(needle) => label.is_some_and(|l| {
            l.to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase())
        }),
    }
}

/// Builds dump lines for the current lights.
pub(crate) fn collect(
    point_lights: &[PointLight],
    static_point_lights: usize,
    polygons: &[PolygonLight],
    grid: Option<&LightGrid>,
    filter: Option<&str>,
) -> Vec<DumpEntry> {
    let mut light_cells = vec![0usize; MAX_POINT_LIGHTS];
    let mut polygon_cells = vec![0usize; MAX_EMISSIVE_POLYGONS];
    if let Some(grid) = grid {
        for cell in grid.cells() {
            for &i in cell.point_lights() {
                light_cells[usize::from(i)] += 1;
            }
            for &i in cell.polygons() {
                polygon_cells[usize::from(i)] += 1;
            }
        }
    }

    let lights = point_lights
        .iter()
        .enumerate()
        .filter(|(_, l)| label_matches(l.label.as_deref(), filter))
        .map(|(index, l)| DumpEntry {
            index,
            kind: DumpKind::Light(l.kind),
            label: l.label.clone(),
            position: l.origin,
            color: l.color,
            extent: l.radius,
            cells: light_cells.get(index).copied().unwrap_or(0),
            is_static: index < static_point_lights,
        });
    let polys = polygons
        .iter()
        .enumerate()
        .filter(|(_, p)| label_matches(p.label.as_deref(), filter))
        .map(|(index, p)| DumpEntry {
            index,
            kind: DumpKind::Polygon,
            label: p.label.clone(),
            position: p.center,
            color: p.emissive,
            extent: p.area,
            cells: polygon_cells.get(index).copied().unwrap_or(0),
            is_static: !p.dynamic,
        });
    lights.chain(polys).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        assert!(label_matches(Some("Hall_Lamp_2"), Some("lamp")));
        assert!(!label_matches(Some("sky"), Some("lamp")));
        assert!(!label_matches(None, Some("lamp")));
        assert!(label_matches(None, None));
        assert!(label_matches(None, Some("")));
    }

    #[test]
    fn test_display() {
        let entry = DumpEntry {
            index: 3,
            kind: DumpKind::Light(LightKind::Spot),
            label: Some("lamp".into()),
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec3::ONE,
            extent: 2.0,
            cells: 4,
            is_static: true,
        };
        assert_eq!(
            entry.to_string(),
            "spot 3 [static] lamp: pos=(1.0 2.0 3.0) R=2.00 color=(1.00 1.00 1.00) cells=4"
        );
    }
}
