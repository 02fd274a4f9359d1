//! Spatial queries the combat core needs from its host.
//!
//! Field-of-view polygons, move destinations and target selection are
//! all phrased in terms of [`SpatialQuery`]. [`ArenaView`] is the
//! reference implementation: thin wall segments that block rays and
//! movement, plus circular participant bodies.

use serde::{Deserialize, Serialize};

use crate::fov::FovPolygon;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::participant::ParticipantId;

/// An obstruction segment. Blocks vision rays and movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wall {
    /// Segment start.
    pub from: Vec2Fixed,
    /// Segment end.
    pub to: Vec2Fixed,
}

impl Wall {
    /// Create a wall segment.
    #[must_use]
    pub const fn new(from: Vec2Fixed, to: Vec2Fixed) -> Self {
        Self { from, to }
    }
}

/// Circular collision body of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Body {
    /// Center position.
    pub position: Vec2Fixed,
    /// Collision radius.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
}

impl Body {
    /// Create a body.
    #[must_use]
    pub const fn new(position: Vec2Fixed, radius: Fixed) -> Self {
        Self { position, radius }
    }

    /// Whether a point lies inside the body.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        self.position.distance_squared(point) <= self.radius.saturating_mul(self.radius)
    }
}

/// A body registered in an [`ArenaView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyEntry {
    /// Owning participant.
    pub id: ParticipantId,
    /// Collision shape.
    pub body: Body,
    /// Defeated participants neither block nor get selected.
    pub defeated: bool,
}

/// Which bodies an overlap query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlapFilter {
    /// Participant to leave out (usually the querying actor).
    pub exclude: Option<ParticipantId>,
    /// Whether defeated participants are eligible.
    pub include_defeated: bool,
}

impl OverlapFilter {
    /// Live participants other than `id`.
    #[must_use]
    pub const fn others_than(id: ParticipantId) -> Self {
        Self {
            exclude: Some(id),
            include_defeated: false,
        }
    }

    fn accepts(&self, entry: &BodyEntry) -> bool {
        self.exclude != Some(entry.id) && (self.include_defeated || !entry.defeated)
    }
}

/// Capability set provided by the collision subsystem.
pub trait SpatialQuery {
    /// Distance along `direction` (unit vector) to the first obstruction,
    /// or `max_distance` if nothing is hit before it.
    fn ray_obstruction_distance(
        &self,
        origin: Vec2Fixed,
        direction: Vec2Fixed,
        max_distance: Fixed,
    ) -> Fixed;

    /// Participants whose bodies overlap `polygon`, in registration order.
    fn entities_overlapping(&self, polygon: &FovPolygon, filter: OverlapFilter)
        -> Vec<ParticipantId>;

    /// How far a circle of `radius` can travel from `origin` along
    /// `direction` before touching a wall or another live body.
    fn sweep_distance(
        &self,
        mover: ParticipantId,
        origin: Vec2Fixed,
        radius: Fixed,
        direction: Vec2Fixed,
        max_distance: Fixed,
    ) -> Fixed;

    /// Live participants whose bodies contain `point`.
    fn hit_test(&self, point: Vec2Fixed) -> Vec<ParticipantId>;
}

/// Walls plus a snapshot of participant bodies for one tick.
#[derive(Debug, Clone)]
pub struct ArenaView<'a> {
    walls: &'a [Wall],
    bodies: Vec<BodyEntry>,
}

impl<'a> ArenaView<'a> {
    /// Build a view over `walls` and `bodies`.
    #[must_use]
    pub fn new(walls: &'a [Wall], bodies: Vec<BodyEntry>) -> Self {
        Self { walls, bodies }
    }

    /// Body of a participant, if present in the view.
    #[must_use]
    pub fn body(&self, id: ParticipantId) -> Option<Body> {
        self.bodies.iter().find(|e| e.id == id).map(|e| e.body)
    }
}

impl SpatialQuery for ArenaView<'_> {
    fn ray_obstruction_distance(
        &self,
        origin: Vec2Fixed,
        direction: Vec2Fixed,
        max_distance: Fixed,
    ) -> Fixed {
        self.walls
            .iter()
            .filter_map(|wall| ray_segment(origin, direction, wall.from, wall.to))
            .fold(max_distance, Fixed::min)
    }

    fn entities_overlapping(
        &self,
        polygon: &FovPolygon,
        filter: OverlapFilter,
    ) -> Vec<ParticipantId> {
        self.bodies
            .iter()
            .filter(|entry| filter.accepts(entry))
            .filter(|entry| polygon.overlaps_circle(entry.body.position, entry.body.radius))
            .map(|entry| entry.id)
            .collect()
    }

    fn sweep_distance(
        &self,
        mover: ParticipantId,
        origin: Vec2Fixed,
        radius: Fixed,
        direction: Vec2Fixed,
        max_distance: Fixed,
    ) -> Fixed {
        let wall_hits = self
            .walls
            .iter()
            .filter_map(|wall| ray_capsule(origin, direction, wall.from, wall.to, radius));

        let body_hits = self
            .bodies
            .iter()
            .filter(|entry| entry.id != mover && !entry.defeated)
            .filter_map(|entry| {
                ray_circle(
                    origin,
                    direction,
                    entry.body.position,
                    entry.body.radius + radius,
                )
            });

        wall_hits.chain(body_hits).fold(max_distance, Fixed::min)
    }

    fn hit_test(&self, point: Vec2Fixed) -> Vec<ParticipantId> {
        self.bodies
            .iter()
            .filter(|entry| !entry.defeated && entry.body.contains(point))
            .map(|entry| entry.id)
            .collect()
    }
}

// ============================================================================
// Geometry primitives
// ============================================================================

/// Distance along a ray to a segment, if the ray crosses it.
#[must_use]
pub fn ray_segment(
    origin: Vec2Fixed,
    dir: Vec2Fixed,
    a: Vec2Fixed,
    b: Vec2Fixed,
) -> Option<Fixed> {
    let edge = b - a;
    let denom = dir.cross(edge);
    if denom == Fixed::ZERO {
        return None;
    }

    let w = a - origin;
    let t = w.cross(edge).checked_div(denom)?;
    let u = w.cross(dir).checked_div(denom)?;

    if t >= Fixed::ZERO && u >= Fixed::ZERO && u <= Fixed::ONE {
        Some(t)
    } else {
        None
    }
}

/// Distance along a ray to a circle.
///
/// A ray starting inside the circle reports a hit at zero unless it
/// points away from the center.
#[must_use]
pub fn ray_circle(
    origin: Vec2Fixed,
    dir: Vec2Fixed,
    center: Vec2Fixed,
    radius: Fixed,
) -> Option<Fixed> {
    let f = origin - center;
    let b = f.dot(dir);
    let c = f.dot(f).saturating_sub(radius.saturating_mul(radius));

    if c <= Fixed::ZERO {
        return if b >= Fixed::ZERO { None } else { Some(Fixed::ZERO) };
    }

    let disc = b.saturating_mul(b).saturating_sub(c);
    if disc < Fixed::ZERO {
        return None;
    }

    let t = -b - crate::math::fixed_sqrt(disc);
    (t >= Fixed::ZERO).then_some(t)
}

/// Distance along a ray to a segment inflated by `radius`.
#[must_use]
pub fn ray_capsule(
    origin: Vec2Fixed,
    dir: Vec2Fixed,
    a: Vec2Fixed,
    b: Vec2Fixed,
    radius: Fixed,
) -> Option<Fixed> {
    let closest = closest_point_on_segment(origin, a, b);
    if origin.distance_squared(closest) <= radius.saturating_mul(radius) {
        return if (origin - closest).dot(dir) >= Fixed::ZERO {
            None
        } else {
            Some(Fixed::ZERO)
        };
    }

    let offset = (b - a).perp().normalize().scale(radius);
    [
        ray_segment(origin, dir, a + offset, b + offset),
        ray_segment(origin, dir, a - offset, b - offset),
        ray_circle(origin, dir, a, radius),
        ray_circle(origin, dir, b, radius),
    ]
    .into_iter()
    .flatten()
    .min()
}

/// Closest point to `p` on segment `a`-`b`.
#[must_use]
pub fn closest_point_on_segment(p: Vec2Fixed, a: Vec2Fixed, b: Vec2Fixed) -> Vec2Fixed {
    let edge = b - a;
    let len_sq = edge.dot(edge);
    if len_sq == Fixed::ZERO {
        return a;
    }
    let t = ((p - a).dot(edge) / len_sq).clamp(Fixed::ZERO, Fixed::ONE);
    a + edge.scale(t)
}

/// Squared distance from `p` to segment `a`-`b`.
#[must_use]
pub fn segment_distance_squared(p: Vec2Fixed, a: Vec2Fixed, b: Vec2Fixed) -> Fixed {
    p.distance_squared(closest_point_on_segment(p, a, b))
}

/// Whether `p` lies inside (or on the border of) triangle `a`, `b`, `c`.
///
/// Works for either winding.
#[must_use]
pub fn point_in_triangle(p: Vec2Fixed, a: Vec2Fixed, b: Vec2Fixed, c: Vec2Fixed) -> bool {
    let d1 = (b - a).cross(p - a);
    let d2 = (c - b).cross(p - b);
    let d3 = (a - c).cross(p - c);

    let has_neg = d1 < Fixed::ZERO || d2 < Fixed::ZERO || d3 < Fixed::ZERO;
    let has_pos = d1 > Fixed::ZERO || d2 > Fixed::ZERO || d3 > Fixed::ZERO;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn near(a: Fixed, b: Fixed) -> bool {
        (a - b).abs() < Fixed::from_num(0.001)
    }

    #[test]
    fn test_ray_segment_hit_and_miss() {
        let hit = ray_segment(v(0, 0), v(1, 0), v(5, -1), v(5, 1));
        assert_eq!(hit, Some(fx(5)));

        // Behind the origin
        assert_eq!(ray_segment(v(0, 0), v(-1, 0), v(5, -1), v(5, 1)), None);
        // Parallel
        assert_eq!(ray_segment(v(0, 0), v(1, 0), v(0, 1), v(5, 1)), None);
        // Past the segment end
        assert_eq!(ray_segment(v(0, 0), v(1, 0), v(5, 1), v(5, 3)), None);
    }

    #[test]
    fn test_ray_circle() {
        let t = ray_circle(v(0, 0), v(1, 0), v(10, 0), fx(2)).unwrap();
        assert!(near(t, fx(8)));
        assert_eq!(ray_circle(v(0, 0), v(0, 1), v(10, 0), fx(2)), None);
    }

    #[test]
    fn test_ray_circle_from_inside() {
        // Moving toward the center is blocked immediately.
        assert_eq!(ray_circle(v(1, 0), v(-1, 0), v(0, 0), fx(2)), Some(Fixed::ZERO));
        // Moving away is free.
        assert_eq!(ray_circle(v(1, 0), v(1, 0), v(0, 0), fx(2)), None);
    }

    #[test]
    fn test_ray_capsule_respects_radius() {
        let t = ray_capsule(v(0, 0), v(1, 0), v(5, -3), v(5, 3), fx(1)).unwrap();
        assert!(near(t, fx(4)));
    }

    #[test]
    fn test_point_in_triangle_both_windings() {
        assert!(point_in_triangle(v(1, 1), v(0, 0), v(4, 0), v(0, 4)));
        assert!(point_in_triangle(v(1, 1), v(0, 0), v(0, 4), v(4, 0)));
        assert!(!point_in_triangle(v(5, 5), v(0, 0), v(4, 0), v(0, 4)));
    }

    #[test]
    fn test_segment_distance() {
        assert_eq!(segment_distance_squared(v(0, 3), v(-5, 0), v(5, 0)), fx(9));
        assert_eq!(segment_distance_squared(v(8, 4), v(-5, 0), v(5, 0)), fx(25));
    }

    #[test]
    fn test_arena_sweep_stops_at_wall_and_bodies() {
        let walls = [Wall::new(v(10, -5), v(10, 5))];
        let mover = ParticipantId(0);
        let view = ArenaView::new(
            &walls,
            vec![
                BodyEntry {
                    id: mover,
                    body: Body::new(v(0, 0), fx(1)),
                    defeated: false,
                },
                BodyEntry {
                    id: ParticipantId(1),
                    body: Body::new(v(0, 6), fx(1)),
                    defeated: false,
                },
            ],
        );

        let east = view.sweep_distance(mover, v(0, 0), fx(1), v(1, 0), fx(100));
        assert!(near(east, fx(9)));

        let north = view.sweep_distance(mover, v(0, 0), fx(1), v(0, 1), fx(100));
        assert!(near(north, fx(4)));

        let capped = view.sweep_distance(mover, v(0, 0), fx(1), v(-1, 0), fx(3));
        assert_eq!(capped, fx(3));
    }

    #[test]
    fn test_arena_ignores_defeated_bodies() {
        let view = ArenaView::new(
            &[],
            vec![BodyEntry {
                id: ParticipantId(4),
                body: Body::new(v(3, 0), fx(1)),
                defeated: true,
            }],
        );
        assert!(view.hit_test(v(3, 0)).is_empty());
        let d = view.sweep_distance(ParticipantId(0), v(0, 0), fx(1), v(1, 0), fx(10));
        assert_eq!(d, fx(10));
    }

    #[test]
    fn test_ray_obstruction_defaults_to_max() {
        let view = ArenaView::new(&[], Vec::new());
        assert_eq!(view.ray_obstruction_distance(v(0, 0), v(1, 0), fx(7)), fx(7));
    }
}
