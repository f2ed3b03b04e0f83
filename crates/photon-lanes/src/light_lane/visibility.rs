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

//! Which leaves a light can reach.
//!
//! Leaf sets for static surfaces are computed once per map and cached.
//! Moving surfaces and point lights are evaluated on every call.

use super::error::LightError;
use photon_core::math::{Aabb, RowTransform, Vec3};
use photon_core::spatial::{LeafBits, LeafIndex, SpatialMap, SurfaceId};

/// An ordered, duplicate-free list of leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleLeafSet {
    leaves: Vec<LeafIndex>,
}

impl VisibleLeafSet {
    /// Every real leaf of the map, in order.
    pub fn all(map: &dyn SpatialMap) -> Self {
        Self {
            leaves: (1..=map.leaf_count() as u32).map(LeafIndex).collect(),
        }
    }

    /// Iterates over the leaves.
    pub fn iter(&self) -> impl Iterator<Item = LeafIndex> + '_ {
        self.leaves.iter().copied()
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns `true` if no leaf is visible.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Reusable storage behind a [`LeafAccumulator`].
#[derive(Debug, Default)]
struct AccumulatorStorage {
    added: LeafBits,
    order: Vec<LeafIndex>,
}

/// Builds one [`VisibleLeafSet`], counting direct leaves and leaves that
/// were only reached through a PVS.
#[derive(Debug)]
pub struct LeafAccumulator<'a> {
    storage: &'a mut AccumulatorStorage,
    direct: usize,
    through_pvs: isize,
}

impl<'a> LeafAccumulator<'a> {
    fn begin(storage: &'a mut AccumulatorStorage, leaf_count: usize) -> Self {
        if storage.added.capacity() == leaf_count + 1 {
            storage.added.clear();
        } else {
            storage.added = LeafBits::new(leaf_count);
        }
        storage.order.clear();
        Self {
            storage,
            direct: 0,
            through_pvs: 0,
        }
    }

    /// Adds a leaf the light touches directly.
    ///
    /// A leaf already reached through a PVS moves from the PVS count to the
    /// direct count.
    pub fn add_direct(&mut self, leaf: LeafIndex) {
        self.direct += 1;
        if !self.push(leaf) {
            self.through_pvs -= 1;
        }
    }

    /// Adds every leaf of a PVS row.
    pub fn add_pvs(&mut self, row: &LeafBits) {
        for leaf in row.iter() {
            if self.push(leaf) {
                self.through_pvs += 1;
            }
        }
    }

    fn push(&mut self, leaf: LeafIndex) -> bool {
        if leaf.is_solid() || !self.storage.added.insert(leaf) {
            return false;
        }
        self.storage.order.push(leaf);
        true
    }

    /// Ends accumulation and returns the collected set.
    pub fn finish(self, what: std::fmt::Arguments<'_>) -> VisibleLeafSet {
        log::trace!(
            "{what}: {} direct leaves, {} through PVS, {} total",
            self.direct,
            self.through_pvs,
            self.storage.order.len()
        );
        VisibleLeafSet {
            leaves: self.storage.order.clone(),
        }
    }
}

/// Leaf visibility for the loaded map.
#[derive(Debug, Default)]
pub struct VisibilityCache {
    surfaces: Vec<Option<VisibleLeafSet>>,
    storage: AccumulatorStorage,
}

impl VisibilityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached set and sizes the cache for a new map.
    pub fn reset(&mut self, surface_count: usize) {
        self.surfaces.clear();
        self.surfaces.resize(surface_count, None);
    }

    /// Number of surfaces whose set has been computed.
    pub fn cached_count(&self) -> usize {
        self.surfaces.iter().filter(|s| s.is_some()).count()
    }

    /// Leaves that can see a static surface.
    ///
    /// These are the leaves that list the surface, plus the PVS of each of
    /// them. The result is computed on first request and cached.
    pub fn leaves_for_surface(
        &mut self,
        map: &dyn SpatialMap,
        surface: SurfaceId,
    ) -> Result<&VisibleLeafSet, LightError> {
        let storage = &mut self.storage;
        let slot = self
            .surfaces
            .get_mut(surface.0 as usize)
            .ok_or(LightError::UnsupportedSurface(surface))?;
        Ok(slot.get_or_insert_with(|| {
            let mut acc = LeafAccumulator::begin(storage, map.leaf_count());
            for i in 1..=map.leaf_count() as u32 {
                let index = LeafIndex(i);
                let Some(leaf) = map.leaf(index) else {
                    continue;
                };
                for _ in leaf.marked_surfaces.iter().filter(|&&s| s == surface) {
                    acc.add_direct(index);
                    acc.add_pvs(&map.pvs(index));
                }
            }
            acc.finish(format_args!("Surface {}", surface.0))
        }))
    }

    /// Leaves that can see a moving surface with local `bounds` placed by
    /// `transform`. Not cached.
    pub fn leaves_for_moving_bounds(
        &mut self,
        map: &dyn SpatialMap,
        bounds: &Aabb,
        transform: &RowTransform,
    ) -> VisibleLeafSet {
        let center = transform.transform_point(bounds.center());
        let radius = 0.5 * bounds.size().length();
        let fat = map.fat_pvs(center, radius);

        let mut acc = LeafAccumulator::begin(&mut self.storage, map.leaf_count());
        for leaf in fat.iter() {
            acc.add_direct(leaf);
        }
        acc.finish(format_args!("Moving surface at {center:?}"))
    }

    /// Leaves that can see a point: its own leaf and that leaf's PVS.
    ///
    /// A point inside solid space sees nothing.
    pub fn leaves_for_point(&mut self, map: &dyn SpatialMap, origin: Vec3) -> VisibleLeafSet {
        let leaf = map.leaf_at_point(origin);
        let mut acc = LeafAccumulator::begin(&mut self.storage, map.leaf_count());
        if !leaf.is_solid() {
            acc.add_direct(leaf);
            acc.add_pvs(&map.pvs(leaf));
        }
        acc.finish(format_args!("Point at {origin:?}"))
    }
}
