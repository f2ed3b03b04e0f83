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

//! The leaf/surface view of a loaded map.

use super::pvs::{self, LeafBits};
use crate::math::{Aabb, Vec3};
use std::fmt::Debug;

/// Index of a BSP leaf. Leaf 0 is the shared solid leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafIndex(pub u32);

impl LeafIndex {
    /// The solid leaf, outside of any playable space.
    pub const SOLID: Self = Self(0);

    /// Returns `true` for the solid leaf.
    #[inline]
    pub fn is_solid(self) -> bool {
        self.0 == 0
    }
}

/// Index of a world surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// A leaf of the map.
#[derive(Debug, Clone, Default)]
pub struct MapLeaf {
    /// World-space bounds.
    pub bounds: Aabb,
    /// Compressed PVS row; `None` when the map carries no visibility data.
    pub compressed_pvs: Option<Vec<u8>>,
    /// Surfaces drawn from this leaf.
    pub marked_surfaces: Vec<SurfaceId>,
}

/// A world surface.
#[derive(Debug, Clone, Default)]
pub struct MapSurface {
    /// World-space bounds.
    pub bounds: Aabb,
    /// Texture name, as used for emissive annotations.
    pub texture: String,
}

/// Leaf, surface and visibility queries on a loaded map.
///
/// Real leaves are numbered `1..=leaf_count()`.
pub trait SpatialMap: Send + Sync + Debug {
    /// Map file name, e.g. `maps/base1.bsp`.
    fn name(&self) -> &str;

    /// World bounds of the playable space.
    fn bounds(&self) -> Aabb;

    /// Number of real leaves.
    fn leaf_count(&self) -> usize;

    /// Looks up a leaf. Index 0 and indices past `leaf_count` return `None`.
    fn leaf(&self, index: LeafIndex) -> Option<&MapLeaf>;

    /// Whether PVS data is present.
    fn has_visdata(&self) -> bool;

    /// The leaf containing `point`, or [`LeafIndex::SOLID`].
    fn leaf_at_point(&self, point: Vec3) -> LeafIndex;

    /// Number of surfaces.
    fn surface_count(&self) -> usize;

    /// Looks up a surface.
    fn surface(&self, id: SurfaceId) -> Option<&MapSurface>;

    /// Decoded PVS of one leaf; every leaf when the map has no visibility data.
    fn pvs(&self, index: LeafIndex) -> LeafBits {
        let count = self.leaf_count();
        if !self.has_visdata() {
            return LeafBits::all(count);
        }
        match self.leaf(index).and_then(|l| l.compressed_pvs.as_deref()) {
            Some(row) => pvs::decompress(row, count),
            None => LeafBits::new(count),
        }
    }

    /// Union of the PVS of every leaf touched by the sphere's bounding box,
    /// together with those leaves.
    fn fat_pvs(&self, origin: Vec3, radius: f32) -> LeafBits {
        let count = self.leaf_count();
        if !self.has_visdata() {
            return LeafBits::all(count);
        }
        let query = Aabb::from_sphere(origin, radius);
        let mut out = LeafBits::new(count);
        for i in 1..=count as u32 {
            let index = LeafIndex(i);
            let Some(leaf) = self.leaf(index) else {
                continue;
            };
            if leaf.bounds.intersects_aabb(&query) {
                out.insert(index);
                out.union_with(&self.pvs(index));
            }
        }
        out
    }
}

/// An in-memory map, as produced by a map loader.
#[derive(Debug, Clone, Default)]
pub struct BspMap {
    name: String,
    bounds: Aabb,
    leaves: Vec<MapLeaf>,
    surfaces: Vec<MapSurface>,
    visdata: bool,
}

impl BspMap {
    /// Builds a map from its real leaves (leaf 1 first) and surfaces.
    ///
    /// Bounds are the union of the leaf bounds. The map has visibility data
    /// when at least one leaf carries a PVS row.
    pub fn new(name: impl Into<String>, leaves: Vec<MapLeaf>, surfaces: Vec<MapSurface>) -> Self {
        let bounds = leaves
            .iter()
            .fold(Aabb::INVALID, |acc, leaf| acc.merge(&leaf.bounds));
        let visdata = leaves.iter().any(|l| l.compressed_pvs.is_some());
        Self {
            name: name.into(),
            bounds,
            leaves,
            surfaces,
            visdata,
        }
    }

    /// Overrides the world bounds.
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = bounds;
        self
    }
}

impl SpatialMap for BspMap {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    fn leaf(&self, index: LeafIndex) -> Option<&MapLeaf> {
        if index.is_solid() {
            return None;
        }
        self.leaves.get(index.0 as usize - 1)
    }

    fn has_visdata(&self) -> bool {
        self.visdata
    }

    fn leaf_at_point(&self, point: Vec3) -> LeafIndex {
        self.leaves
            .iter()
            .position(|l| l.bounds.contains_point(point))
            .map_or(LeafIndex::SOLID, |i| LeafIndex(i as u32 + 1))
    }

    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn surface(&self, id: SurfaceId) -> Option<&MapSurface> {
        self.surfaces.get(id.0 as usize)
    }
}
