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

//! Row-major 3x4 affine transforms, the form consumed by instance descriptors.

use super::Vec3;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A 3x4 affine transform stored as three rows `[m0, m1, m2, t]`.
///
/// Transforming a point `p` computes `dot(row.xyz, p) + row.w` for each row.
/// This is the exact layout written into top-level instance descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RowTransform(pub [[f32; 4]; 3]);

impl RowTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
    ]);

    // --- CONSTRUCTORS ---

    /// Creates a pure translation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use photon_core::math::{RowTransform, Vec3};
    ///
    /// let t = RowTransform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(t.transform_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
    /// ```
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.0[0][3] = v.x;
        m.0[1][3] = v.y;
        m.0[2][3] = v.z;
        m
    }

    /// Creates a non-uniform scale.
    #[inline]
    pub fn from_scale(s: Vec3) -> Self {
        Self([
            [s.x, 0.0, 0.0, 0.0],
            [0.0, s.y, 0.0, 0.0],
            [0.0, 0.0, s.z, 0.0],
        ])
    }

    /// Creates a rotation of `angle` radians around the Z axis.
    #[inline]
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self([[c, -s, 0.0, 0.0], [s, c, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]])
    }

    // --- ACCESSORS ---

    /// Returns the translation column.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.0[0][3], self.0[1][3], self.0[2][3])
    }

    /// Applies the transform to a point.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let row = |r: &[f32; 4]| r[0] * p.x + r[1] * p.y + r[2] * p.z + r[3];
        Vec3::new(row(&self.0[0]), row(&self.0[1]), row(&self.0[2]))
    }

    /// Composes two transforms: the result applies `rhs` first, then `self`.
    pub fn then(&self, rhs: &Self) -> Self {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [[0.0f32; 4]; 3];
        for (i, out_row) in out.iter_mut().enumerate() {
            for (j, value) in out_row.iter_mut().enumerate() {
                let mut acc = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
                if j == 3 {
                    acc += a[i][3];
                }
                *value = acc;
            }
        }
        Self(out)
    }
}

impl Default for RowTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_keeps_points() {
        let p = Vec3::new(3.0, -2.0, 7.0);
        assert_eq!(RowTransform::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn test_rotation_then_translation() {
        let rotate = RowTransform::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let translate = RowTransform::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let combined = translate.then(&rotate);
        let p = combined.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
        assert_eq!(combined.translation(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_scale() {
        let s = RowTransform::from_scale(Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(s.transform_point(Vec3::ONE), Vec3::new(2.0, 3.0, 4.0));
    }
}
