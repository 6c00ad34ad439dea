//! Continuous collision detection: a second, coarser broad-phase over each
//! step's swept motion, used to catch fast bodies that would otherwise
//! tunnel straight through thin geometry between two discrete steps.

use std::collections::HashSet;

use crate::dynamics::fixture::Fixture;
use crate::dynamics::joint::JointSet;
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::ContinuousDetectionMode;
use crate::geometry::aabb::Aabb;
use crate::geometry::broad_phase::BroadPhase;
use crate::geometry::collision_data::CollisionDataMap;
use crate::geometry::shape::Shape;
use crate::geometry::toi::{time_of_impact, MotionSweep};
use crate::math::Real;
use crate::pipeline::listeners::TimeOfImpactListener;
use crate::pipeline::physics_pipeline::is_joint_collision_blocked;

/// Whether any fixture of `a` and any fixture of `b` already has a confirmed
/// contact manifold. A pair the discrete solver is already resolving this
/// tick doesn't need CCD clamping on top.
fn bodies_already_in_contact(collisions: &CollisionDataMap, a: BodyHandle, b: BodyHandle) -> bool {
    collisions.iter().any(|data| {
        let same_pair = (data.fixture_a.0 == a && data.fixture_b.0 == b) || (data.fixture_a.0 == b && data.fixture_b.0 == a);
        same_pair && data.is_manifold_collision()
    })
}

/// Whether two fixtures are even eligible to clamp each other: neither is a
/// sensor, and the category/mask filter allows them to collide at all.
fn fixtures_eligible(a: &Fixture, b: &Fixture) -> bool {
    !a.is_sensor && !b.is_sensor && a.filter.can_collide(&b.filter)
}

fn bounding_radius(shape: &dyn Shape) -> Real {
    let (min, max) = shape.local_aabb_extents();
    min.coords.norm().max(max.coords.norm()) + shape.radius()
}

fn swept_aabb(body: &crate::dynamics::rigid_body::Body) -> Option<Aabb> {
    let mut result: Option<Aabb> = None;
    for (_, fixture) in body.live_fixtures() {
        let start = Aabb::of_shape(fixture.shape.as_ref(), &body.previous_transform);
        let end = Aabb::of_shape(fixture.shape.as_ref(), &body.transform);
        let swept = start.merged(&end);
        result = Some(match result {
            Some(acc) => acc.merged(&swept),
            None => swept,
        });
    }
    result
}

fn motion_of(body: &crate::dynamics::rigid_body::Body, dt: Real) -> MotionSweep {
    MotionSweep {
        start: body.previous_transform,
        linvel: body.linear_velocity,
        angvel: body.angular_velocity,
        dt,
    }
}

fn is_eligible(mode: ContinuousDetectionMode, body: &crate::dynamics::rigid_body::Body) -> bool {
    if !body.body_type.participates_in_islands() || body.is_asleep() {
        return false;
    }
    match mode {
        ContinuousDetectionMode::None => false,
        ContinuousDetectionMode::BulletsOnly => body.is_bullet(),
        ContinuousDetectionMode::AllDynamic => true,
    }
}

/// A fresh, coarse broad-phase rebuilt every step over swept AABBs, used
/// only to find CCD candidate pairs (the fine-grained persistent broad-phase
/// lives on [`RigidBodySet`]).
#[derive(Default)]
pub struct CcdSolver {
    broad_phase: BroadPhase<BodyHandle>,
}

impl CcdSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamps every eligible body's motion to the earliest time-of-impact it
    /// participates in this step, at most once per body. A body already
    /// touching something at `t=0` is left alone: reclamping it to zero
    /// motion every step would permanently freeze it against a crossed
    /// fixture instead of letting the discrete solver separate them.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &mut self,
        bodies: &mut RigidBodySet,
        joints: &JointSet,
        collisions: &CollisionDataMap,
        mode: ContinuousDetectionMode,
        dt: Real,
        toi_listeners: &mut [Box<dyn TimeOfImpactListener>],
    ) {
        if mode == ContinuousDetectionMode::None {
            return;
        }

        self.broad_phase.clear();
        let candidates: Vec<BodyHandle> = bodies
            .iter()
            .filter(|(_, body)| is_eligible(mode, body))
            .filter_map(|(handle, body)| swept_aabb(body).map(|aabb| (handle, aabb)))
            .map(|(handle, aabb)| {
                self.broad_phase.add(handle, aabb);
                handle
            })
            .collect();

        if candidates.is_empty() {
            return;
        }

        let mut clamped: HashSet<BodyHandle> = HashSet::new();

        for &handle in &candidates {
            if clamped.contains(&handle) {
                continue;
            }
            let Some(aabb) = self.broad_phase.get_aabb(handle) else {
                continue;
            };
            let Some(body) = bodies.get(handle) else {
                continue;
            };
            let body_is_bullet = body.is_bullet();
            let motion = motion_of(body, dt);

            let mut earliest: Option<(Real, BodyHandle)> = None;
            for other in self.broad_phase.query_aabb(&aabb) {
                if other == handle {
                    continue;
                }
                let Some(other_body) = bodies.get(other) else {
                    continue;
                };

                // Dynamic-vs-dynamic under `AllDynamic` still needs a bullet
                // on at least one side; `BulletsOnly` already filtered the
                // candidate set down to bullets.
                if mode == ContinuousDetectionMode::AllDynamic
                    && other_body.body_type.participates_in_islands()
                    && !body_is_bullet
                    && !other_body.is_bullet()
                {
                    continue;
                }

                // A joint explicitly disallowing collision between this pair,
                // or a pair the discrete solver already has a confirmed
                // contact for this tick, doesn't need CCD on top.
                if is_joint_collision_blocked(joints, handle, other) || bodies_already_in_contact(collisions, handle, other) {
                    continue;
                }
                if toi_listeners.iter_mut().any(|l| !l.allow_body_pair(handle, other)) {
                    continue;
                }

                let other_motion = motion_of(other_body, dt);
                let mut pair_earliest: Option<Real> = None;
                for (id_a, fixture_a) in body.live_fixtures() {
                    for (id_b, fixture_b) in other_body.live_fixtures() {
                        if !fixtures_eligible(fixture_a, fixture_b) {
                            continue;
                        }
                        if toi_listeners.iter_mut().any(|l| !l.allow_fixture_pair((handle, id_a), (other, id_b))) {
                            continue;
                        }
                        let bound_a = bounding_radius(fixture_a.shape.as_ref());
                        let bound_b = bounding_radius(fixture_b.shape.as_ref());
                        if let Some(t) = time_of_impact(
                            fixture_a.shape.as_ref(),
                            &motion,
                            bound_a,
                            fixture_b.shape.as_ref(),
                            &other_motion,
                            bound_b,
                            0.0,
                            1.0,
                        ) {
                            pair_earliest = Some(pair_earliest.map_or(t, |e: Real| e.min(t)));
                        }
                    }
                }

                if let Some(t) = pair_earliest {
                    if t <= 1.0e-6 {
                        continue;
                    }
                    if earliest.map_or(true, |(e, _)| t < e) {
                        earliest = Some((t, other));
                    }
                }
            }

            if let Some((t, other)) = earliest {
                if let Some(body) = bodies.get_mut(handle) {
                    body.transform = motion.at(t);
                    body.linear_velocity = crate::math::Vector::zeros();
                    body.angular_velocity = 0.0;
                }
                for listener in toi_listeners.iter_mut() {
                    listener.resolved(handle, other, t);
                }
                clamped.insert(handle);
            }
        }

        for handle in candidates {
            bodies.sync_fixture_aabbs(handle);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::fixture::FixtureBuilder;
    use crate::dynamics::rigid_body::{Body, BodyType};
    use crate::geometry::shape::Circle;
    use crate::math::Vector;

    fn bullet_through_wall() -> (RigidBodySet, BodyHandle, BodyHandle) {
        let mut bodies = RigidBodySet::new();

        let mut wall = Body::new(BodyType::Static);
        wall.fixtures.push(Some(FixtureBuilder::new(Box::new(Circle { radius: 0.5 })).build()));
        wall.recompute_mass();
        let wall_handle = bodies.insert(wall);

        let mut bullet = Body::new(BodyType::Dynamic);
        bullet.fixtures.push(Some(FixtureBuilder::new(Box::new(Circle { radius: 0.05 })).density(1.0).build()));
        bullet.recompute_mass();
        bullet.flags.insert(crate::dynamics::rigid_body::BodyFlags::BULLET);
        bullet.transform.translation.vector = Vector::new(-1.0, 0.0);
        bullet.previous_transform = bullet.transform;
        bullet.linear_velocity = Vector::new(50.0, 0.0);
        bullet.transform.translation.vector = Vector::new(-1.0 + 50.0 / 60.0, 0.0);
        let bullet_handle = bodies.insert(bullet);

        (bodies, wall_handle, bullet_handle)
    }

    #[test]
    fn fast_bullet_is_clamped_before_tunneling_through_the_wall() {
        let (mut bodies, _wall, bullet) = bullet_through_wall();
        let mut ccd = CcdSolver::new();
        let joints = JointSet::new();
        let collisions = CollisionDataMap::new();
        let mut toi_listeners: Vec<Box<dyn TimeOfImpactListener>> = Vec::new();
        ccd.solve(&mut bodies, &joints, &collisions, ContinuousDetectionMode::BulletsOnly, 1.0 / 60.0, &mut toi_listeners);

        let final_x = bodies.get(bullet).unwrap().transform.translation.vector.x;
        assert!(final_x < 0.5, "expected the bullet to stop short of the wall, got x={final_x}");
    }

    #[test]
    fn none_mode_never_clamps_anything() {
        let (mut bodies, _wall, bullet) = bullet_through_wall();
        let unclamped_x = bodies.get(bullet).unwrap().transform.translation.vector.x;
        let mut ccd = CcdSolver::new();
        let joints = JointSet::new();
        let collisions = CollisionDataMap::new();
        let mut toi_listeners: Vec<Box<dyn TimeOfImpactListener>> = Vec::new();
        ccd.solve(&mut bodies, &joints, &collisions, ContinuousDetectionMode::None, 1.0 / 60.0, &mut toi_listeners);
        assert_eq!(bodies.get(bullet).unwrap().transform.translation.vector.x, unclamped_x);
    }

    #[test]
    fn a_sensor_fixture_never_clamps_a_body() {
        let mut bodies = RigidBodySet::new();

        let mut sensor = Body::new(BodyType::Static);
        sensor.fixtures.push(Some(FixtureBuilder::new(Box::new(Circle { radius: 0.5 })).sensor(true).build()));
        sensor.recompute_mass();
        bodies.insert(sensor);

        let mut bullet = Body::new(BodyType::Dynamic);
        bullet.fixtures.push(Some(FixtureBuilder::new(Box::new(Circle { radius: 0.05 })).density(1.0).build()));
        bullet.recompute_mass();
        bullet.flags.insert(crate::dynamics::rigid_body::BodyFlags::BULLET);
        bullet.transform.translation.vector = Vector::new(-1.0, 0.0);
        bullet.previous_transform = bullet.transform;
        bullet.linear_velocity = Vector::new(50.0, 0.0);
        bullet.transform.translation.vector = Vector::new(-1.0 + 50.0 / 60.0, 0.0);
        let bullet_handle = bodies.insert(bullet);

        let unclamped_x = bodies.get(bullet_handle).unwrap().transform.translation.vector.x;
        let mut ccd = CcdSolver::new();
        let joints = JointSet::new();
        let collisions = CollisionDataMap::new();
        let mut toi_listeners: Vec<Box<dyn TimeOfImpactListener>> = Vec::new();
        ccd.solve(&mut bodies, &joints, &collisions, ContinuousDetectionMode::BulletsOnly, 1.0 / 60.0, &mut toi_listeners);
        assert_eq!(bodies.get(bullet_handle).unwrap().transform.translation.vector.x, unclamped_x);
    }

    struct RefusingToiListener;
    impl TimeOfImpactListener for RefusingToiListener {
        fn allow_body_pair(&mut self, _a: BodyHandle, _b: BodyHandle) -> bool {
            false
        }
    }

    #[test]
    fn a_toi_listener_can_veto_a_candidate_pair() {
        let (mut bodies, _wall, bullet) = bullet_through_wall();
        let unclamped_x = bodies.get(bullet).unwrap().transform.translation.vector.x;
        let mut ccd = CcdSolver::new();
        let joints = JointSet::new();
        let collisions = CollisionDataMap::new();
        let mut toi_listeners: Vec<Box<dyn TimeOfImpactListener>> = vec![Box::new(RefusingToiListener)];
        ccd.solve(&mut bodies, &joints, &collisions, ContinuousDetectionMode::BulletsOnly, 1.0 / 60.0, &mut toi_listeners);
        assert_eq!(bodies.get(bullet).unwrap().transform.translation.vector.x, unclamped_x);
    }
}
