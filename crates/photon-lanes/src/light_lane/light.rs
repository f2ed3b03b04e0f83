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

//! Light records held by the registry and the descriptors used to add them.

use photon_core::math::{degrees_to_radians, Aabb, RowTransform, Vec3, Vec4};
use photon_core::renderer::clustering::{GpuPointLight, GpuPolygonLight};
use photon_core::spatial::SurfaceId;

/// Shape of a point light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    /// Omnidirectional.
    #[default]
    Point,
    /// Cone-limited.
    Spot,
    /// Sun or sky light, cone-limited and flagged for the shaders.
    Environment,
}

/// Parameters of a light to add.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightDescriptor {
    /// Shape of the light.
    pub kind: LightKind,
    /// World position.
    pub origin: Vec3,
    /// Cone axis; ignored for [`LightKind::Point`].
    pub direction: Vec3,
    /// Color before attenuation.
    pub color: Vec3,
    /// Radius; values `<= 0` select the configured default.
    pub radius: f32,
    /// Cosine of the inner cone angle.
    pub stopdot: f32,
    /// Cosine of the outer cone angle.
    pub stopdot2: f32,
    /// Light-style slot animating the color.
    pub style: Option<usize>,
    /// Name shown in dumps.
    pub label: Option<String>,
}

impl LightDescriptor {
    /// An omnidirectional light.
    pub fn point(origin: Vec3, color: Vec3, radius: f32) -> Self {
        Self {
            kind: LightKind::Point,
            origin,
            color,
            radius,
            ..Self::default()
        }
    }

    /// A cone light with inner and outer half-angles in degrees.
    pub fn spot(origin: Vec3, direction: Vec3, color: Vec3, inner_deg: f32, outer_deg: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            origin,
            direction,
            color,
            stopdot: degrees_to_radians(inner_deg).cos(),
            stopdot2: degrees_to_radians(outer_deg).cos(),
            ..Self::default()
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the light-style slot.
    pub fn with_style(mut self, style: usize) -> Self {
        self.style = Some(style);
        self
    }
}

/// A short-lived light from the client's dynamic light list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicLight {
    /// World position.
    pub origin: Vec3,
    /// Color on a 0-255 scale.
    pub color: Vec3,
    /// Distance at which the light fades out.
    pub radius: f32,
}

/// A registered point, spot or environment light.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    /// Shape of the light.
    pub kind: LightKind,
    /// World position.
    pub origin: Vec3,
    /// Cone axis, zero for point lights.
    pub direction: Vec3,
    /// Radius.
    pub radius: f32,
    /// Color after attenuation, before styles.
    pub base_color: Vec3,
    /// Color after styles; this is what gets uploaded.
    pub color: Vec3,
    /// Cosine of the inner cone angle, `-1` for point lights.
    pub stopdot: f32,
    /// Cosine of the outer cone angle, `-1` for point lights.
    pub stopdot2: f32,
    /// Light-style slot.
    pub style: Option<usize>,
    /// Name shown in dumps.
    pub label: Option<String>,
}

impl PointLight {
    pub(crate) fn from_descriptor(desc: &LightDescriptor, radius: f32, attenuation: f32) -> Self {
        let base_color = desc.color * attenuation;
        let (direction, stopdot, stopdot2) = match desc.kind {
            LightKind::Point => (Vec3::ZERO, -1.0, -1.0),
            LightKind::Spot | LightKind::Environment => {
                (desc.direction, desc.stopdot, desc.stopdot2)
            }
        };
        Self {
            kind: desc.kind,
            origin: desc.origin,
            direction,
            radius,
            base_color,
            color: base_color,
            stopdot,
            stopdot2,
            style: desc.style,
            label: desc.label.clone(),
        }
    }

    /// Whether the shaders treat this as an environment light.
    pub fn is_environment(&self) -> bool {
        self.kind == LightKind::Environment
    }

    /// GPU layout of this light.
    pub fn to_gpu(&self) -> GpuPointLight {
        GpuPointLight {
            origin_r: Vec4::from_vec3(self.origin, self.radius).to_array(),
            color_stopdot: Vec4::from_vec3(self.color, self.stopdot).to_array(),
            dir_stopdot2: Vec4::from_vec3(self.direction, self.stopdot2).to_array(),
            environment: u32::from(self.is_environment()),
            _pad: [0; 3],
        }
    }
}

/// Where an emissive polygon lives, which decides the leaves that see it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolygonSource {
    /// A world surface; its leaf set is cached.
    Static(SurfaceId),
    /// A surface of a moving model, with local bounds and model transform.
    Moving {
        /// Bounds in model space.
        bounds: Aabb,
        /// Model-to-world transform.
        transform: RowTransform,
    },
}

/// Parameters of an emissive polygon to add.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonDescriptor<'a> {
    /// Vertices, 3 to 7, in winding order.
    pub vertices: &'a [Vec3],
    /// Applied to every vertex before anything else.
    pub transform: Option<RowTransform>,
    /// Emitted color.
    pub emissive: Vec3,
    /// What the polygon belongs to.
    pub source: PolygonSource,
    /// Name shown in dumps.
    pub label: Option<String>,
}

/// A registered emissive polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonLight {
    /// Unit normal in `xyz`, plane distance in `w`.
    pub plane: Vec4,
    /// Vertex average.
    pub center: Vec3,
    /// Area.
    pub area: f32,
    /// Emitted color.
    pub emissive: Vec3,
    /// First vertex in the shared vertex array.
    pub vertex_offset: u32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Added during a frame rather than at map load.
    pub dynamic: bool,
    /// Name shown in dumps.
    pub label: Option<String>,
}

impl PolygonLight {
    /// Plane, centroid and area of a convex polygon, or `None` when the area
    /// is zero.
    pub fn geometry(vertices: &[Vec3]) -> Option<(Vec4, Vec3, f32)> {
        let first = *vertices.first()?;
        let mut normal = Vec3::ZERO;
        for i in 2..vertices.len() {
            normal += (vertices[i] - first).cross(vertices[i - 1] - first);
        }
        let area = normal.length();
        if area <= f32::EPSILON {
            return None;
        }
        let n = normal / area;
        let plane = Vec4::from_vec3(n, -first.dot(n));

        let mut sum = Vec3::ZERO;
        for &v in vertices {
            sum += v;
        }
        Some((plane, sum / vertices.len() as f32, area))
    }

    /// GPU layout of this polygon.
    pub fn to_gpu(&self) -> GpuPolygonLight {
        GpuPolygonLight {
            plane: self.plane.to_array(),
            center: self.center.to_array(),
            area: self.area,
            emissive: self.emissive.to_array(),
            vertices_count_offset: GpuPolygonLight::pack_vertices(
                self.vertex_offset,
                self.vertex_count,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_light_is_omnidirectional() {
        let desc = LightDescriptor {
            direction: Vec3::new(0.0, 0.0, -1.0),
            stopdot: 0.5,
            ..LightDescriptor::point(Vec3::ZERO, Vec3::splat(100.0), 4.0)
        };
        let light = PointLight::from_descriptor(&desc, 4.0, 0.1);
        assert_eq!(light.direction, Vec3::ZERO);
        assert_eq!(light.stopdot, -1.0);
        assert_eq!(light.stopdot2, -1.0);
        assert_relative_eq!(light.base_color.x, 10.0);
    }

    #[test]
    fn test_environment_keeps_cone_and_flags() {
        let desc = LightDescriptor {
            kind: LightKind::Environment,
            ..LightDescriptor::spot(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::ONE, 60.0, 60.0)
        };
        let gpu = PointLight::from_descriptor(&desc, 2.0, 1.0).to_gpu();
        assert_eq!(gpu.environment, 1);
        assert_eq!(gpu.dir_stopdot2[2], -1.0);
        assert_relative_eq!(gpu.color_stopdot[3], 0.5, epsilon = 1e-6);
        assert_eq!(gpu.origin_r[3], 2.0);
    }

    #[test]
    fn test_square_geometry() {
        let square = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let (plane, center, area) = PolygonLight::geometry(&square).unwrap();
        assert_relative_eq!(area, 8.0);
        assert_eq!(plane.truncate(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(plane.w, 0.0);
        assert_eq!(center, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_degenerate_geometry() {
        let line = [Vec3::ZERO, Vec3::ONE, Vec3::splat(2.0)];
        assert!(PolygonLight::geometry(&line).is_none());
    }

    #[test]
    fn test_polygon_gpu_packs_run() {
        let poly = PolygonLight {
            plane: Vec4::new(0.0, 0.0, 1.0, -5.0),
            center: Vec3::ZERO,
            area: 1.0,
            emissive: Vec3::ONE,
            vertex_offset: 21,
            vertex_count: 4,
            dynamic: false,
            label: None,
        };
        assert_eq!(poly.to_gpu().vertices_count_offset, (4 << 16) | 21);
    }
}
