//! Field-of-view / range polygons.
//!
//! A polygon is built as a triangle fan around an origin: `ray_count + 1`
//! rays are cast across the angular span and each one stops at the first
//! obstruction or at the radius, whichever is closer. The same polygon is
//! drawn by the presentation layer and used as the shape of overlap
//! queries ("who is within attack range").
//!
//! # Angles
//!
//! Angles are bearings in degrees: 0 points along +Y and angles grow
//! clockwise. Rays sweep from `center + half_span` down to
//! `center - half_span`.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::spatial::{point_in_triangle, segment_distance_squared, SpatialQuery};

/// Default number of rays, matching the attack range overlay.
pub const DEFAULT_RAY_COUNT: u32 = 500;

/// Vision parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FovParams {
    /// Maximum ray length.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Bearing of the middle of the cone, in degrees.
    #[serde(with = "fixed_serde")]
    pub center_angle: Fixed,
    /// Half of the cone width, in degrees. 180 is a full circle.
    #[serde(with = "fixed_serde")]
    pub half_angle_span: Fixed,
    /// Number of triangles in the fan.
    pub ray_count: u32,
}

impl FovParams {
    /// A full 360° circle, as used for range queries.
    #[must_use]
    pub fn full_circle(radius: Fixed, ray_count: u32) -> Self {
        Self {
            radius,
            center_angle: Fixed::ZERO,
            half_angle_span: Fixed::from_num(180),
            ray_count,
        }
    }

    /// A vision cone.
    #[must_use]
    pub fn cone(
        radius: Fixed,
        center_angle: Fixed,
        half_angle_span: Fixed,
        ray_count: u32,
    ) -> Self {
        Self {
            radius,
            center_angle,
            half_angle_span,
            ray_count,
        }
    }
}

/// A triangle-fan polygon in world space.
///
/// `vertices[0]` is the origin; `vertices[1..]` are the ray endpoints.
/// Triangle `i` is `(0, i + 1, i + 2)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FovPolygon {
    vertices: Vec<Vec2Fixed>,
    triangles: Vec<[u32; 3]>,
}

impl FovPolygon {
    /// Cast the rays and build the fan.
    ///
    /// A `ray_count` of zero yields the origin plus a single ray endpoint
    /// and no triangles.
    #[must_use]
    pub fn build(origin: Vec2Fixed, params: FovParams, spatial: &dyn SpatialQuery) -> Self {
        let ray_count = params.ray_count;
        let span = params.half_angle_span * Fixed::from_num(2);
        let step = if ray_count == 0 {
            Fixed::ZERO
        } else {
            span / Fixed::from_num(ray_count)
        };

        let mut vertices = Vec::with_capacity(ray_count as usize + 2);
        let mut triangles = Vec::with_capacity(ray_count as usize);
        vertices.push(origin);

        let mut angle = params.center_angle + params.half_angle_span;
        for i in 0..=ray_count {
            let direction = Vec2Fixed::from_bearing(angle);
            let distance = spatial
                .ray_obstruction_distance(origin, direction, params.radius)
                .min(params.radius);
            vertices.push(origin + direction.scale(distance));

            if i > 0 {
                triangles.push([0, i, i + 1]);
            }
            angle -= step;
        }

        Self {
            vertices,
            triangles,
        }
    }

    /// Origin of the fan.
    #[must_use]
    pub fn origin(&self) -> Vec2Fixed {
        self.vertices[0]
    }

    /// All vertices, origin first.
    #[must_use]
    pub fn vertices(&self) -> &[Vec2Fixed] {
        &self.vertices
    }

    /// Triangle index triples.
    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    fn triangle(&self, tri: [u32; 3]) -> [Vec2Fixed; 3] {
        tri.map(|i| self.vertices[i as usize])
    }

    /// Whether `point` is inside any triangle of the fan.
    #[must_use]
    pub fn contains_point(&self, point: Vec2Fixed) -> bool {
        self.triangles.iter().any(|&tri| {
            let [a, b, c] = self.triangle(tri);
            point_in_triangle(point, a, b, c)
        })
    }

    /// Whether a circle intersects the fan.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2Fixed, radius: Fixed) -> bool {
        let r_sq = radius.saturating_mul(radius);
        self.triangles.iter().any(|&tri| {
            let [a, b, c] = self.triangle(tri);
            point_in_triangle(center, a, b, c)
                || segment_distance_squared(center, a, b) <= r_sq
                || segment_distance_squared(center, b, c) <= r_sq
                || segment_distance_squared(center, c, a) <= r_sq
        })
    }
}
