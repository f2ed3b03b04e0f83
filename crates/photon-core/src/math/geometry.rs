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

//! Axis-aligned bounding boxes for map leaves, surfaces and grid cells.

use super::Vec3;
use serde::{Deserialize, Serialize};

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// Leaves of the spatial map, emissive surfaces and light-grid cells are all
/// described by their min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An invalid `Aabb` where `min` components are positive infinity and `max` are negative infinity.
    ///
    /// Merging any valid `Aabb` with `INVALID` yields that valid `Aabb`.
    pub const INVALID: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Creates a new `Aabb` from two corner points, in any order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates the box enclosing a sphere.
    #[inline]
    pub fn from_sphere(center: Vec3, radius: f32) -> Self {
        let r = Vec3::splat(radius.abs());
        Self {
            min: center - r,
            max: center + r,
        }
    }

    /// Creates an `Aabb` that tightly encloses a given set of points.
    ///
    /// # Returns
    ///
    /// Returns `Some(Aabb)` if the input slice is not empty, otherwise `None`.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(
            Self {
                min: *first,
                max: *first,
            },
            |acc, p| Self {
                min: acc.min.min(*p),
                max: acc.max.max(*p),
            },
        ))
    }

    /// Returns the center point of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the full size of the box along each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Checks if the box is valid (`min <= max` on all axes).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Checks if a point is inside or on the boundary of the box.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point.x >= self.min.x && point.x <= self.max.x)
            && (point.y >= self.min.y && point.y <= self.max.y)
            && (point.z >= self.min.z && point.z <= self.max.z)
    }

    /// Checks if this box intersects with another. Touching faces count.
    #[inline]
    pub fn intersects_aabb(&self, other: &Aabb) -> bool {
        (self.min.x <= other.max.x && self.max.x >= other.min.x)
            && (self.min.y <= other.max.y && self.max.y >= other.min.y)
            && (self.min.z <= other.max.z && self.max.z >= other.min.z)
    }

    /// Creates a new box that encompasses both this one and another.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::INVALID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_min_max_orders_corners() {
        let aabb = Aabb::from_min_max(Vec3::new(5.0, -1.0, 2.0), Vec3::new(-5.0, 1.0, -2.0));
        assert_eq!(aabb.min, Vec3::new(-5.0, -1.0, -2.0));
        assert_eq!(aabb.max, Vec3::new(5.0, 1.0, 2.0));
    }

    #[test]
    fn test_from_points() {
        assert!(Aabb::from_points(&[]).is_none());
        let aabb = Aabb::from_points(&[
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-1.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 9.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 9.0));
    }

    #[test]
    fn test_center_and_size() {
        let aabb = Aabb::from_min_max(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 8.0));
        assert_eq!(aabb.center(), Vec3::new(2.0, 1.0, 4.0));
        assert_eq!(aabb.size(), Vec3::new(4.0, 2.0, 8.0));
    }

    #[test]
    fn test_intersection_includes_touching_faces() {
        let a = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_min_max(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::from_min_max(Vec3::splat(3.0), Vec3::splat(4.0));
        assert!(a.intersects_aabb(&b));
        assert!(!a.intersects_aabb(&c));
    }

    #[test]
    fn test_merge_with_invalid_is_identity() {
        let a = Aabb::from_sphere(Vec3::new(1.0, 1.0, 1.0), 2.0);
        assert!(!Aabb::INVALID.is_valid());
        assert_eq!(Aabb::INVALID.merge(&a), a);
    }
}
