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

//! The light registry.
//!
//! Holds every point light and emissive polygon of the current frame together
//! with the grid that indexes them.
//!
//! # Lifecycle
//!
//! 1. [`begin_map_load`](LightRegistry::begin_map_load) sizes the grid for the
//!    map and reads the emissive annotations.
//! 2. Static lights and world polygons are added.
//! 3. [`end_map_load`](LightRegistry::end_map_load) freezes what was added as
//!    the static baseline.
//! 4. Each frame runs [`begin_frame`](LightRegistry::begin_frame), which
//!    rewinds to the baseline, then dynamic additions, then
//!    [`end_frame`](LightRegistry::end_frame).

use super::dump::{self, DumpEntry};
use super::emissive::EmissiveTable;
use super::error::{LightError, RegistryPhase};
use super::grid::{CellSlot, InsertReport, LightGrid};
use super::light::{
    DynamicLight, LightDescriptor, LightKind, PointLight, PolygonDescriptor, PolygonLight,
    PolygonSource,
};
use super::visibility::{VisibilityCache, VisibleLeafSet};
use crate::throttle::Throttle;
use arrayvec::ArrayVec;
use photon_core::io::TextSource;
use photon_core::math::Vec3;
use photon_core::renderer::clustering::{
    LightBindings, MAX_ADDRESSABLE_POLYGONS, MAX_EMISSIVE_POLYGONS, MAX_POINT_LIGHTS,
    MAX_POLYGON_VERTICES, MAX_VERTICES_PER_POLYGON,
};
use photon_core::renderer::LightSettings;
use photon_core::spatial::SpatialMap;
use std::sync::Arc;

const DLIGHT_RADIUS: f32 = 2.0;

const FLASHLIGHT_COLOR: Vec3 = Vec3::new(255.0, 255.0, 192.0);
const FLASHLIGHT_INNER_CONE_DEG: f32 = 10.0;
const FLASHLIGHT_OUTER_CONE_DEG: f32 = 30.0;

/// Throttled error sites of the registry.
#[derive(Debug, Clone)]
pub struct LightDiagnostics {
    /// Point-light array full.
    pub point_capacity: Throttle,
    /// Polygon array full.
    pub polygon_capacity: Throttle,
    /// Vertex array full.
    pub vertex_capacity: Throttle,
    /// A cell had no point-light slot left.
    pub point_slots: Throttle,
    /// A cell had no polygon slot left.
    pub polygon_slots: Throttle,
    /// More polygons than an 8-bit index can address.
    pub polygon_clamp: Throttle,
}

impl LightDiagnostics {
    fn new(settings: &LightSettings) -> Self {
        let throttle = Throttle::new(settings.throttle_interval());
        Self {
            point_capacity: throttle.clone(),
            polygon_capacity: throttle.clone(),
            vertex_capacity: throttle.clone(),
            point_slots: throttle.clone(),
            polygon_slots: throttle.clone(),
            polygon_clamp: throttle,
        }
    }
}

/// Sizes of the static baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticCounts {
    /// Static point lights.
    pub point_lights: usize,
    /// Static polygons.
    pub polygons: usize,
    /// Vertices used by static polygons.
    pub vertices: usize,
}

/// Summary returned by [`LightRegistry::end_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightFrameStats {
    /// Point lights this frame.
    pub point_lights: usize,
    /// Polygons this frame, after clamping.
    pub polygons: usize,
    /// Cells the next upload will copy.
    pub dirty_cells: usize,
    /// Cells whose stamp changed since the previous `end_frame`.
    pub newly_dirty_cells: usize,
    /// Size of the dirty cells in KiB.
    pub dirty_cells_kib: f32,
}

/// Lights and emissive polygons of the loaded map.
#[derive(Debug)]
pub struct LightRegistry {
    settings: LightSettings,
    phase: RegistryPhase,
    map: Option<Arc<dyn SpatialMap>>,
    grid: Option<LightGrid>,
    visibility: VisibilityCache,
    emissive: EmissiveTable,
    point_lights: Vec<PointLight>,
    polygons: Vec<PolygonLight>,
    vertices: Vec<Vec3>,
    baseline: StaticCounts,
    diagnostics: LightDiagnostics,
    pending_dump: Option<String>,
}

impl LightRegistry {
    /// Creates an empty registry.
    pub fn new(settings: LightSettings) -> Self {
        Self {
            diagnostics: LightDiagnostics::new(&settings),
            settings,
            phase: RegistryPhase::Empty,
            map: None,
            grid: None,
            visibility: VisibilityCache::new(),
            emissive: EmissiveTable::new(),
            point_lights: Vec::with_capacity(MAX_POINT_LIGHTS),
            polygons: Vec::with_capacity(MAX_EMISSIVE_POLYGONS),
            vertices: Vec::with_capacity(MAX_POLYGON_VERTICES),
            baseline: StaticCounts::default(),
            pending_dump: None,
        }
    }

    // --- Map load ---

    /// Clears all lights and prepares the grid and annotations for `map`.
    pub fn begin_map_load(
        &mut self,
        map: Arc<dyn SpatialMap>,
        annotations: &dyn TextSource,
    ) -> Result<(), LightError> {
        let sequence = self.grid.as_ref().map_or(0, LightGrid::frame_sequence);
        self.point_lights.clear();
        self.polygons.clear();
        self.vertices.clear();
        self.baseline = StaticCounts::default();
        self.pending_dump = None;
        self.grid = None;
        self.map = None;
        self.phase = RegistryPhase::Empty;

        let grid = match LightGrid::new(&map.bounds(), sequence) {
            Ok(grid) => grid,
            Err(err) => {
                log::error!("LightRegistry: cannot load {}: {err}", map.name());
                return Err(err);
            }
        };
        let dims = grid.dimensions();
        log::info!(
            "LightRegistry: {} grid is {}x{}x{} cells starting at {:?}",
            map.name(),
            dims.size[0],
            dims.size[1],
            dims.size[2],
            dims.min_cell
        );

        self.visibility.reset(map.surface_count());
        self.emissive = EmissiveTable::load(annotations, map.name());
        self.grid = Some(grid);
        self.map = Some(map);
        self.phase = RegistryPhase::Loading;
        Ok(())
    }

    /// Adds one static light.
    ///
    /// Returns `Ok(None)` when the light is black and was skipped.
    pub fn add_static_light(&mut self, desc: &LightDescriptor) -> Result<Option<usize>, LightError> {
        self.require("add_static_light", &[RegistryPhase::Loading])?;
        self.add_described(desc, false)
    }

    /// Adds the static lights of a map and returns how many were added.
    ///
    /// When the list holds exactly one environment light, that light is put
    /// in every cell. Stops at the first light that cannot be added.
    pub fn add_static_lights(&mut self, lights: &[LightDescriptor]) -> usize {
        if let Err(err) = self.require("add_static_lights", &[RegistryPhase::Loading]) {
            log::error!("LightRegistry: {err}");
            return 0;
        }
        let environments = lights
            .iter()
            .filter(|l| l.kind == LightKind::Environment)
            .count();

        let mut added = 0;
        for desc in lights {
            let everywhere = environments == 1 && desc.kind == LightKind::Environment;
            match self.add_described(desc, everywhere) {
                Ok(Some(_)) => added += 1,
                Ok(None) => {}
                Err(err) => {
                    log::warn!("LightRegistry: stopped adding static lights: {err}");
                    break;
                }
            }
        }
        log::info!("LightRegistry: added {added} of {} static lights", lights.len());
        added
    }

    /// Freezes everything added so far as the static baseline.
    pub fn end_map_load(&mut self) -> Result<(), LightError> {
        self.require("end_map_load", &[RegistryPhase::Loading])?;
        self.baseline = StaticCounts {
            point_lights: self.point_lights.len(),
            polygons: self.polygons.len(),
            vertices: self.vertices.len(),
        };
        if let Some(grid) = self.grid.as_mut() {
            grid.freeze();
            grid.mark_all_dirty();
        }
        self.phase = RegistryPhase::Ready;
        log::info!(
            "LightRegistry: static baseline has {} point lights, {} polygons, {} vertices",
            self.baseline.point_lights,
            self.baseline.polygons,
            self.baseline.vertices
        );
        Ok(())
    }

    // --- Per frame ---

    /// Drops every dynamic light and polygon.
    pub fn begin_frame(&mut self) -> Result<(), LightError> {
        self.require("begin_frame", &[RegistryPhase::Ready])?;
        self.point_lights.truncate(self.baseline.point_lights);
        self.polygons.truncate(self.baseline.polygons);
        self.vertices.truncate(self.baseline.vertices);
        if let Some(grid) = self.grid.as_mut() {
            grid.rewind();
        }
        Ok(())
    }

    /// Adds a light for this frame only.
    pub fn add_dynamic_light(&mut self, desc: &LightDescriptor) -> Result<Option<usize>, LightError> {
        self.require("add_dynamic_light", &[RegistryPhase::Ready])?;
        self.add_described(desc, false)
    }

    /// Adds an entry of the client's dynamic light list.
    ///
    /// The light is replaced by a small point light whose color is scaled so
    /// that it matches the original falloff at the original radius. Lights
    /// that are too dim or too small are skipped.
    pub fn add_dlight(&mut self, dlight: &DynamicLight) -> Result<Option<usize>, LightError> {
        self.require("add_dlight", &[RegistryPhase::Ready])?;
        let max = dlight.color.max_element();
        if max < 2.0 || dlight.radius <= DLIGHT_RADIUS {
            return Ok(None);
        }
        let d = dlight.radius;
        let r = DLIGHT_RADIUS;
        let scale = 2.0 / (max * (1.0 - (d * d - r * r).sqrt() / d));
        let desc = LightDescriptor::point(dlight.origin, dlight.color * scale, DLIGHT_RADIUS);
        let light = PointLight::from_descriptor(&desc, DLIGHT_RADIUS, 1.0);
        self.insert_point_light(light, false).map(Some)
    }

    /// Adds a player's flashlight as a spot light.
    pub fn add_flashlight(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        local_player: bool,
    ) -> Result<Option<usize>, LightError> {
        self.require("add_flashlight", &[RegistryPhase::Ready])?;
        let (intensity, radius) = if local_player { (300.0, 1.0) } else { (60.0, 10.0) };
        let color = FLASHLIGHT_COLOR * (intensity / 255.0);
        let peak = color.max_element();
        let desc = LightDescriptor::spot(
            origin,
            direction,
            color * (peak * peak / 10.0),
            FLASHLIGHT_INNER_CONE_DEG,
            FLASHLIGHT_OUTER_CONE_DEG,
        )
        .with_label("flashlight");
        let light = PointLight::from_descriptor(&desc, radius, self.settings.attenuation);
        self.insert_point_light(light, false).map(Some)
    }

    /// Adds an emissive polygon and returns its index.
    ///
    /// Polygons added during map load are static; polygons added after
    /// [`end_map_load`](Self::end_map_load) last one frame. On error nothing
    /// is committed.
    pub fn add_emissive_polygon(&mut self, desc: &PolygonDescriptor<'_>) -> Result<usize, LightError> {
        self.require(
            "add_emissive_polygon",
            &[RegistryPhase::Loading, RegistryPhase::Ready],
        )?;
        let count = desc.vertices.len();
        if !(3..=MAX_VERTICES_PER_POLYGON).contains(&count) {
            return Err(LightError::InvalidPolygon { count });
        }
        // Static polygons must stay addressable by a cell so the per-frame
        // clamp never cuts into the baseline.
        let capacity = if self.phase == RegistryPhase::Loading {
            MAX_ADDRESSABLE_POLYGONS
        } else {
            MAX_EMISSIVE_POLYGONS
        };
        if self.polygons.len() >= capacity {
            self.diagnostics.polygon_capacity.error(format_args!(
                "Too many emissive polygons, capacity is {capacity}"
            ));
            return Err(LightError::PolygonCapacity { capacity });
        }
        let available = MAX_POLYGON_VERTICES - self.vertices.len();
        if count > available {
            self.diagnostics.vertex_capacity.error(format_args!(
                "Polygon vertex array full: {count} requested, {available} left"
            ));
            return Err(LightError::VertexCapacity {
                requested: count,
                available,
            });
        }

        let map = self.loaded_map("add_emissive_polygon")?;
        if let PolygonSource::Static(surface) = desc.source {
            if map.surface(surface).is_none() {
                log::error!(
                    "LightRegistry: surface {} is not part of {}",
                    surface.0,
                    map.name()
                );
                return Err(LightError::UnsupportedSurface(surface));
            }
        }

        let world: ArrayVec<Vec3, MAX_VERTICES_PER_POLYGON> = desc
            .vertices
            .iter()
            .map(|&v| match &desc.transform {
                Some(t) => t.transform_point(v),
                None => v,
            })
            .collect();
        let (plane, center, area) =
            PolygonLight::geometry(&world).ok_or(LightError::DegeneratePolygon)?;

        let index = self.polygons.len();
        let grid = self.grid.as_mut().ok_or(LightError::NotLoaded {
            operation: "add_emissive_polygon",
            phase: self.phase,
        })?;
        let report = if !map.has_visdata() {
            insert_leaves(grid, &*map, &VisibleLeafSet::all(&*map), CellSlot::Polygon, index)
        } else {
            match desc.source {
                PolygonSource::Static(surface) => {
                    let leaves = self.visibility.leaves_for_surface(&*map, surface)?;
                    insert_leaves(grid, &*map, leaves, CellSlot::Polygon, index)
                }
                PolygonSource::Moving { bounds, transform } => {
                    let leaves = self
                        .visibility
                        .leaves_for_moving_bounds(&*map, &bounds, &transform);
                    insert_leaves(grid, &*map, &leaves, CellSlot::Polygon, index)
                }
            }
        };
        report_overflow(&mut self.diagnostics.polygon_slots, report, "polygon");

        let dynamic = self.phase == RegistryPhase::Ready;
        log::debug!(
            "LightRegistry: polygon {index} ({count} vertices, area {area:.1}) in {} cells{}",
            report.added,
            if dynamic { ", dynamic" } else { "" }
        );
        let vertex_offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&world);
        self.polygons.push(PolygonLight {
            plane,
            center,
            area,
            emissive: desc.emissive,
            vertex_offset,
            vertex_count: count as u32,
            dynamic,
            label: desc.label.clone(),
        });
        Ok(index)
    }

    /// Applies animated light styles.
    ///
    /// `styles[i]` is the brightness of style `i` on a 0-255 scale. Lights
    /// without a style, or with a style past the end, keep their color.
    pub fn apply_light_styles(&mut self, styles: &[f32]) {
        for light in &mut self.point_lights {
            if let Some(&value) = light.style.and_then(|s| styles.get(s)) {
                light.color = light.base_color * (value / 255.0);
            }
        }
    }

    /// Finishes the frame's light list.
    ///
    /// Clamps the polygon count to what an 8-bit index addresses, counts the
    /// dirty cells and logs a pending dump.
    pub fn end_frame(&mut self) -> LightFrameStats {
        if self.polygons.len() > MAX_ADDRESSABLE_POLYGONS {
            self.diagnostics.polygon_clamp.error(format_args!(
                "Too many emissive surfaces found: {}; some areas will be dark",
                self.polygons.len()
            ));
            self.polygons.truncate(MAX_ADDRESSABLE_POLYGONS);
            let kept = self
                .polygons
                .last()
                .map_or(0, |p| (p.vertex_offset + p.vertex_count) as usize);
            self.vertices.truncate(kept);
        }

        let (dirty_cells, newly_dirty_cells) = self
            .grid
            .as_mut()
            .map_or((0, 0), |g| (g.dirty_cell_count(), g.take_newly_dirty()));

        if let Some(filter) = self.pending_dump.take() {
            let entries = self.dump_entries(Some(&filter));
            log::info!(
                "LightRegistry: {} entries matching {filter:?}",
                entries.len()
            );
            for entry in entries {
                log::info!("  {entry}");
            }
        }

        LightFrameStats {
            point_lights: self.point_lights.len(),
            polygons: self.polygons.len(),
            dirty_cells,
            newly_dirty_cells,
            dirty_cells_kib: (dirty_cells as u64 * LightBindings::CLUSTER_SIZE) as f32 / 1024.0,
        }
    }

    // --- Queries ---

    /// Annotated color of an enabled emissive texture.
    pub fn emissive_for_texture(&self, texture: &str) -> Option<Vec3> {
        self.emissive.emissive_for_texture(texture)
    }

    /// Asks for a dump of the lights whose label contains `filter` at the
    /// next [`end_frame`](Self::end_frame).
    pub fn request_dump(&mut self, filter: Option<&str>) {
        self.pending_dump = Some(filter.unwrap_or_default().to_string());
    }

    /// Lists the current lights whose label contains `filter`.
    pub fn dump_entries(&self, filter: Option<&str>) -> Vec<DumpEntry> {
        dump::collect(
            &self.point_lights,
            self.baseline.point_lights,
            &self.polygons,
            self.grid.as_ref(),
            filter,
        )
    }

    /// Current phase.
    pub fn phase(&self) -> RegistryPhase {
        self.phase
    }

    /// The loaded map.
    pub fn map(&self) -> Option<&Arc<dyn SpatialMap>> {
        self.map.as_ref()
    }

    /// The grid of the loaded map.
    pub fn grid(&self) -> Option<&LightGrid> {
        self.grid.as_ref()
    }

    pub(crate) fn grid_mut(&mut self) -> Option<&mut LightGrid> {
        self.grid.as_mut()
    }

    /// Point lights of the current frame, static ones first.
    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    /// Polygons of the current frame, static ones first.
    pub fn polygons(&self) -> &[PolygonLight] {
        &self.polygons
    }

    /// Shared polygon vertex array.
    pub fn polygon_vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Sizes of the static baseline.
    pub fn static_counts(&self) -> StaticCounts {
        self.baseline
    }

    /// The visibility cache.
    pub fn visibility(&self) -> &VisibilityCache {
        &self.visibility
    }

    /// Throttled diagnostics raised so far.
    pub fn diagnostics(&self) -> &LightDiagnostics {
        &self.diagnostics
    }

    /// Settings in use.
    pub fn settings(&self) -> &LightSettings {
        &self.settings
    }

    // --- Internals ---

    fn require(&self, operation: &'static str, phases: &[RegistryPhase]) -> Result<(), LightError> {
        if phases.contains(&self.phase) {
            Ok(())
        } else {
            Err(self.not_loaded(operation))
        }
    }

    fn not_loaded(&self, operation: &'static str) -> LightError {
        LightError::NotLoaded {
            operation,
            phase: self.phase,
        }
    }

    fn loaded_map(&self, operation: &'static str) -> Result<Arc<dyn SpatialMap>, LightError> {
        self.map.clone().ok_or_else(|| self.not_loaded(operation))
    }

    fn add_described(
        &mut self,
        desc: &LightDescriptor,
        everywhere: bool,
    ) -> Result<Option<usize>, LightError> {
        if desc.color == Vec3::ZERO {
            log::debug!(
                "LightRegistry: skipping black light at {:?}",
                desc.origin
            );
            return Ok(None);
        }
        let radius = if desc.radius > 0.0 {
            desc.radius
        } else {
            self.settings.default_radius
        };
        let light = PointLight::from_descriptor(desc, radius, self.settings.attenuation);
        self.insert_point_light(light, everywhere).map(Some)
    }

    fn insert_point_light(&mut self, light: PointLight, everywhere: bool) -> Result<usize, LightError> {
        if self.point_lights.len() >= MAX_POINT_LIGHTS {
            self.diagnostics.point_capacity.error(format_args!(
                "Too many point lights, capacity is {MAX_POINT_LIGHTS}"
            ));
            return Err(LightError::PointLightCapacity {
                capacity: MAX_POINT_LIGHTS,
            });
        }
        let map = self.loaded_map("add_point_light")?;
        let index = self.point_lights.len();
        let grid = self.grid.as_mut().ok_or(LightError::NotLoaded {
            operation: "add_point_light",
            phase: self.phase,
        })?;
        let leaves = if everywhere || !map.has_visdata() {
            VisibleLeafSet::all(&*map)
        } else {
            self.visibility.leaves_for_point(&*map, light.origin)
        };
        let report = insert_leaves(grid, &*map, &leaves, CellSlot::PointLight, index);
        report_overflow(&mut self.diagnostics.point_slots, report, "point light");

        log::debug!(
            "LightRegistry: {:?} light {index} at {:?} R={} in {} cells",
            light.kind,
            light.origin,
            light.radius,
            report.added
        );
        self.point_lights.push(light);
        Ok(index)
    }
}

fn insert_leaves(
    grid: &mut LightGrid,
    map: &dyn SpatialMap,
    leaves: &VisibleLeafSet,
    slot: CellSlot,
    index: usize,
) -> InsertReport {
    // Both arrays hold at most 256 entries, so every index fits in a byte.
    let mut inserter = grid.inserter(slot, index as u8);
    for leaf in leaves.iter() {
        if let Some(leaf) = map.leaf(leaf) {
            inserter.add_leaf(&leaf.bounds);
        }
    }
    inserter.report()
}

fn report_overflow(throttle: &mut Throttle, report: InsertReport, what: &str) {
    if let Some((cell, index)) = report.first_rejected {
        throttle.error(format_args!(
            "Cell {},{},{}({index}) ran out of {what} slots ({} cells full)",
            cell[0], cell[1], cell[2], report.rejected
        ));
    }
}
