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

//! The spatial light grid.
//!
//! World space is cut into cubes of [`LIGHT_GRID_CELL_SIZE`] units covering
//! the map bounds. Each cell lists the point lights and emissive polygons
//! that may reach it, as 8-bit indices into the frame's light arrays.
//!
//! Cells carry the frame sequence in which they last changed. The uploader
//! copies only cells stamped with the current sequence.

use arrayvec::ArrayVec;
use photon_core::math::{Aabb, Vec3};
use photon_core::memory::BitSet;
use photon_core::renderer::clustering::{
    GpuLightCluster, LIGHT_GRID_CELL_SIZE, MAX_LIGHT_CLUSTERS, MAX_VISIBLE_POINT_LIGHTS,
    MAX_VISIBLE_SURFACE_LIGHTS,
};
use std::ops::Range;

use super::error::LightError;

/// Which list of a cell an insertion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSlot {
    /// The point-light list. Leaf bounds are rounded outwards on both sides.
    PointLight,
    /// The polygon list. The upper bound is floored, then extended by one.
    Polygon,
}

/// One cell of the grid.
#[derive(Debug, Clone, Default)]
pub struct GridCell {
    point_lights: ArrayVec<u8, MAX_VISIBLE_POINT_LIGHTS>,
    polygons: ArrayVec<u8, MAX_VISIBLE_SURFACE_LIGHTS>,
    static_point_lights: usize,
    static_polygons: usize,
    frame_sequence: u32,
}

impl GridCell {
    /// Point-light indices, static entries first.
    pub fn point_lights(&self) -> &[u8] {
        &self.point_lights
    }

    /// Polygon indices, static entries first.
    pub fn polygons(&self) -> &[u8] {
        &self.polygons
    }

    /// Sequence of the frame that last changed this cell.
    pub fn frame_sequence(&self) -> u32 {
        self.frame_sequence
    }

    /// Number of entries that survive a rewind, as `(point lights, polygons)`.
    pub fn static_counts(&self) -> (usize, usize) {
        (self.static_point_lights, self.static_polygons)
    }

    /// Writes this cell into its GPU layout.
    pub fn write_gpu(&self, out: &mut GpuLightCluster) {
        out.num_point_lights = self.point_lights.len() as u8;
        out.num_polygons = self.polygons.len() as u8;
        out.point_lights[..self.point_lights.len()].copy_from_slice(&self.point_lights);
        out.polygons[..self.polygons.len()].copy_from_slice(&self.polygons);
    }

    fn push(&mut self, slot: CellSlot, index: u8) -> bool {
        match slot {
            CellSlot::PointLight => self.point_lights.try_push(index).is_ok(),
            CellSlot::Polygon => self.polygons.try_push(index).is_ok(),
        }
    }

    fn rewind(&mut self) -> bool {
        let dynamic = self.point_lights.len() > self.static_point_lights
            || self.polygons.len() > self.static_polygons;
        self.point_lights.truncate(self.static_point_lights);
        self.polygons.truncate(self.static_polygons);
        dynamic
    }
}

/// Integer extent of the grid, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDimensions {
    /// Cell coordinates of the minimum corner.
    pub min_cell: [i32; 3],
    /// Number of cells along each axis.
    pub size: [i32; 3],
}

impl GridDimensions {
    /// Cells covering `bounds`: `floor(min / size)` up to `ceil(max / size)`.
    ///
    /// Invalid bounds give an empty grid.
    pub fn from_bounds(bounds: &Aabb) -> Self {
        if !bounds.is_valid() {
            return Self::default();
        }
        let lo = cell_floor(bounds.min);
        let hi = cell_ceil(bounds.max);
        Self {
            min_cell: lo,
            size: [
                (hi[0] - lo[0]).max(0),
                (hi[1] - lo[1]).max(0),
                (hi[2] - lo[2]).max(0),
            ],
        }
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.size.iter().map(|&s| s.max(0) as usize).product()
    }

    /// Linear index of an absolute cell coordinate, or `None` outside the grid.
    pub fn index_of(&self, cell: [i32; 3]) -> Option<usize> {
        let mut rel = [0usize; 3];
        for axis in 0..3 {
            let r = cell[axis] - self.min_cell[axis];
            if r < 0 || r >= self.size[axis] {
                return None;
            }
            rel[axis] = r as usize;
        }
        let sx = self.size[0] as usize;
        let sy = self.size[1] as usize;
        Some(rel[0] + rel[1] * sx + rel[2] * sx * sy)
    }

    /// Absolute cell coordinate of a linear index.
    pub fn cell_of(&self, index: usize) -> [i32; 3] {
        let sx = self.size[0].max(1) as usize;
        let sy = self.size[1].max(1) as usize;
        [
            self.min_cell[0] + (index % sx) as i32,
            self.min_cell[1] + ((index / sx) % sy) as i32,
            self.min_cell[2] + (index / (sx * sy)) as i32,
        ]
    }
}

fn cell_floor(v: Vec3) -> [i32; 3] {
    [
        (v.x / LIGHT_GRID_CELL_SIZE).floor() as i32,
        (v.y / LIGHT_GRID_CELL_SIZE).floor() as i32,
        (v.z / LIGHT_GRID_CELL_SIZE).floor() as i32,
    ]
}

fn cell_ceil(v: Vec3) -> [i32; 3] {
    [
        (v.x / LIGHT_GRID_CELL_SIZE).ceil() as i32,
        (v.y / LIGHT_GRID_CELL_SIZE).ceil() as i32,
        (v.z / LIGHT_GRID_CELL_SIZE).ceil() as i32,
    ]
}

/// Absolute cell range touched by a leaf's bounds, end exclusive per axis.
pub fn leaf_cell_range(bounds: &Aabb, slot: CellSlot) -> ([i32; 3], [i32; 3]) {
    let lo = cell_floor(bounds.min);
    let hi = match slot {
        CellSlot::PointLight => cell_ceil(bounds.max),
        CellSlot::Polygon => {
            let f = cell_floor(bounds.max);
            [f[0] + 1, f[1] + 1, f[2] + 1]
        }
    };
    (lo, hi)
}

/// Outcome of one insertion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    /// Cells the light was added to.
    pub added: usize,
    /// Cells that were already full.
    pub rejected: usize,
    /// First full cell, as `(coordinate, index)`.
    pub first_rejected: Option<([i32; 3], usize)>,
}

/// The grid for the loaded map.
#[derive(Debug, Clone)]
pub struct LightGrid {
    dims: GridDimensions,
    cells: Vec<GridCell>,
    visited: BitSet,
    frame_sequence: u32,
    newly_dirty: usize,
}

impl LightGrid {
    /// Creates an empty grid covering `bounds`, with every cell stamped dirty.
    pub fn new(bounds: &Aabb, frame_sequence: u32) -> Result<Self, LightError> {
        let dims = GridDimensions::from_bounds(bounds);
        let count = dims.cell_count();
        if count > MAX_LIGHT_CLUSTERS {
            return Err(LightError::GridTooLarge {
                cells: count,
                max: MAX_LIGHT_CLUSTERS,
            });
        }
        let cell = GridCell {
            frame_sequence,
            ..GridCell::default()
        };
        Ok(Self {
            dims,
            cells: vec![cell; count],
            visited: BitSet::new(count),
            frame_sequence,
            newly_dirty: count,
        })
    }

    /// Grid extent.
    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    /// All cells, in linear order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Current frame sequence.
    pub fn frame_sequence(&self) -> u32 {
        self.frame_sequence
    }

    /// Moves to the next frame sequence.
    pub fn advance_sequence(&mut self) {
        self.frame_sequence = self.frame_sequence.wrapping_add(1);
    }

    /// Whether a cell changed during the current sequence.
    pub fn is_dirty(&self, index: usize) -> bool {
        self.cells
            .get(index)
            .is_some_and(|c| c.frame_sequence == self.frame_sequence)
    }

    /// Number of cells stamped with the current sequence.
    pub fn dirty_cell_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.frame_sequence == self.frame_sequence)
            .count()
    }

    /// Maximal runs of consecutive dirty cells, in ascending order.
    pub fn dirty_runs(&self) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, cell) in self.cells.iter().enumerate() {
            let dirty = cell.frame_sequence == self.frame_sequence;
            match (dirty, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push(s..self.cells.len());
        }
        runs
    }

    /// Returns and resets the number of cells whose stamp changed.
    pub fn take_newly_dirty(&mut self) -> usize {
        std::mem::take(&mut self.newly_dirty)
    }

    /// Stamps every cell with the current sequence.
    pub fn mark_all_dirty(&mut self) {
        let seq = self.frame_sequence;
        for cell in &mut self.cells {
            if cell.frame_sequence != seq {
                cell.frame_sequence = seq;
                self.newly_dirty += 1;
            }
        }
    }

    /// Records the current contents as the static baseline.
    pub fn freeze(&mut self) {
        for cell in &mut self.cells {
            cell.static_point_lights = cell.point_lights.len();
            cell.static_polygons = cell.polygons.len();
        }
    }

    /// Drops every dynamic entry, stamping the cells that lost any.
    pub fn rewind(&mut self) {
        let seq = self.frame_sequence;
        for cell in &mut self.cells {
            if cell.rewind() && cell.frame_sequence != seq {
                cell.frame_sequence = seq;
                self.newly_dirty += 1;
            }
        }
    }

    /// Starts adding one light. Each cell receives the light at most once
    /// for the lifetime of the returned inserter.
    pub fn inserter(&mut self, slot: CellSlot, index: u8) -> CellInserter<'_> {
        self.visited.clear_all();
        CellInserter {
            grid: self,
            slot,
            index,
            report: InsertReport::default(),
        }
    }

    fn stamp(&mut self, index: usize) {
        let seq = self.frame_sequence;
        let cell = &mut self.cells[index];
        if cell.frame_sequence != seq {
            cell.frame_sequence = seq;
            self.newly_dirty += 1;
        }
    }
}

/// Adds one light to the cells under a series of leaves.
///
/// Dropping the inserter clears the per-light visited set.
#[derive(Debug)]
pub struct CellInserter<'a> {
    grid: &'a mut LightGrid,
    slot: CellSlot,
    index: u8,
    report: InsertReport,
}

impl CellInserter<'_> {
    /// Adds the light to every cell under `bounds` that has not received it yet.
    pub fn add_leaf(&mut self, bounds: &Aabb) {
        let (mut lo, mut hi) = leaf_cell_range(bounds, self.slot);
        let dims = self.grid.dims;
        for axis in 0..3 {
            lo[axis] = lo[axis].max(dims.min_cell[axis]);
            hi[axis] = hi[axis].min(dims.min_cell[axis].saturating_add(dims.size[axis]));
        }
        for z in lo[2]..hi[2] {
            for y in lo[1]..hi[1] {
                for x in lo[0]..hi[0] {
                    self.add_cell([x, y, z]);
                }
            }
        }
    }

    fn add_cell(&mut self, cell: [i32; 3]) {
        let Some(i) = self.grid.dims.index_of(cell) else {
            return;
        };
        if !self.grid.visited.check_or_set(i) {
            return;
        }
        if self.grid.cells[i].push(self.slot, self.index) {
            self.grid.stamp(i);
            self.report.added += 1;
        } else {
            self.report.rejected += 1;
            self.report.first_rejected.get_or_insert((cell, i));
        }
    }

    /// What has been inserted so far.
    pub fn report(&self) -> InsertReport {
        self.report
    }
}

impl Drop for CellInserter<'_> {
    fn drop(&mut self) {
        self.grid.visited.clear_all();
    }
}
