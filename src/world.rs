//! The public simulation container: owns every body, joint and tracked
//! collision pair, and drives them through [`PhysicsPipeline`] on a fixed
//! timestep accumulator.

use crate::dynamics::fixture::Fixture;
use crate::dynamics::joint::{Joint, JointDef, JointHandle, JointSet};
use crate::dynamics::rigid_body::Body;
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::Settings;
use crate::errors::{PhysicsError, Result};
use crate::geometry::aabb::Aabb;
use crate::geometry::collision_data::{CollisionData, CollisionDataMap, FixtureHandle};
use crate::geometry::gjk::{gjk, GjkResult};
use crate::geometry::narrow_phase::{IdentityPostProcessor, NarrowPhasePostProcessor};
use crate::geometry::query::{raycast_candidates, raycast_closest, raycast_shape, RayHit};
use crate::geometry::shape::Shape;
use crate::geometry::toi::{time_of_impact, MotionSweep};
use crate::geometry::value_mixer::{DefaultValueMixer, ValueMixer};
use crate::math::{Isometry, Point, Real, Vector};
use crate::pipeline::physics_pipeline::is_joint_collision_blocked;
use crate::pipeline::{BroadPhaseFilter, DefaultBroadPhaseFilter, Destroyed, ListenerSet, PhysicsPipeline};

/// Earth gravity, the conventional default (meters, seconds, "up" is +y).
pub const EARTH_GRAVITY: Vector = Vector::new(0.0, -9.8);

/// A complete simulation: bodies, joints, tracked contact pairs, and the
/// pluggable policies (gravity, settings, material mixing, filtering) that
/// govern how they're stepped.
pub struct World {
    bodies: RigidBodySet,
    joints: JointSet,
    collisions: CollisionDataMap,
    pipeline: PhysicsPipeline,
    pub listeners: ListenerSet,

    gravity: Vector,
    settings: Settings,
    bounds: Option<Aabb>,
    value_mixer: Box<dyn ValueMixer>,
    broadphase_filter: Box<dyn BroadPhaseFilter>,
    narrow_phase_post_processor: Box<dyn NarrowPhasePostProcessor>,

    accumulator: Real,
    /// Set for the duration of a pipeline step; body/joint mutation is
    /// rejected while this is set, since a listener callback that reached
    /// back into the world mid-dispatch would invalidate whatever the
    /// pipeline is currently iterating.
    dispatching: bool,
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}

impl World {
    pub fn new() -> Self {
        World {
            bodies: RigidBodySet::new(),
            joints: JointSet::new(),
            collisions: CollisionDataMap::new(),
            pipeline: PhysicsPipeline::new(),
            listeners: ListenerSet::new(),
            gravity: EARTH_GRAVITY,
            settings: Settings::default(),
            bounds: None,
            value_mixer: Box::new(DefaultValueMixer),
            broadphase_filter: Box::new(DefaultBroadPhaseFilter),
            narrow_phase_post_processor: Box::new(IdentityPostProcessor),
            accumulator: 0.0,
            dispatching: false,
        }
    }

    fn check_not_dispatching(&self) -> Result<()> {
        if self.dispatching {
            Err(PhysicsError::IteratorInvalidation)
        } else {
            Ok(())
        }
    }

    // -- body/joint membership -------------------------------------------

    pub fn add_body(&mut self, body: Body) -> Result<BodyHandle> {
        self.check_not_dispatching()?;
        let handle = self.bodies.insert(body);
        self.pipeline.mark_update_required();
        Ok(handle)
    }

    /// Removes a body and cascades: every joint it belongs to, and every
    /// tracked collision pair touching one of its fixtures. `notify` fires
    /// [`crate::pipeline::DestructionListener::destroyed`] for the body and
    /// each cascaded removal.
    pub fn remove_body(&mut self, handle: BodyHandle, notify: bool) -> Result<Body> {
        self.check_not_dispatching()?;

        if notify {
            let dead_pairs: Vec<(FixtureHandle, FixtureHandle)> = self
                .collisions
                .iter()
                .filter(|d| d.fixture_a.0 == handle || d.fixture_b.0 == handle)
                .filter(|d| d.contact_constraint.is_some())
                .map(|d| (d.fixture_a, d.fixture_b))
                .collect();
            for (a, b) in dead_pairs {
                for listener in &mut self.listeners.destruction {
                    listener.destroyed(Destroyed::ContactConstraint(a, b));
                }
            }
        }
        self.collisions.retain(|d: &CollisionData| d.fixture_a.0 != handle && d.fixture_b.0 != handle);

        let dead_joints: Vec<JointHandle> = self.joints.iter().filter(|(_, j)| j.is_member(handle)).map(|(h, _)| h).collect();
        for joint_handle in dead_joints {
            self.joints.remove(joint_handle);
            if notify {
                for listener in &mut self.listeners.destruction {
                    listener.destroyed(Destroyed::Joint(joint_handle));
                }
            }
        }

        let body = self.bodies.remove(handle).ok_or(PhysicsError::MembershipViolation)?;
        if notify {
            for listener in &mut self.listeners.destruction {
                listener.destroyed(Destroyed::Body(handle));
            }
        }
        self.pipeline.mark_update_required();
        Ok(body)
    }

    /// Adds a joint; fails if either body is not a member of this world.
    pub fn add_joint(&mut self, joint: JointDef) -> Result<JointHandle> {
        self.check_not_dispatching()?;
        let (a, b) = joint.bodies();
        if !self.bodies.contains(a) || !self.bodies.contains(b) {
            return Err(PhysicsError::MembershipViolation);
        }
        let handle = self.joints.insert(joint);
        self.pipeline.mark_update_required();
        Ok(handle)
    }

    pub fn remove_joint(&mut self, handle: JointHandle, notify: bool) -> Result<JointDef> {
        self.check_not_dispatching()?;
        let joint = self.joints.remove(handle).ok_or(PhysicsError::MembershipViolation)?;
        if notify {
            for listener in &mut self.listeners.destruction {
                listener.destroyed(Destroyed::Joint(handle));
            }
        }
        self.pipeline.mark_update_required();
        Ok(joint)
    }

    pub fn remove_all_bodies_and_joints(&mut self, notify: bool) -> Result<()> {
        self.check_not_dispatching()?;
        if notify {
            let joint_handles: Vec<JointHandle> = self.joints.iter().map(|(h, _)| h).collect();
            for handle in joint_handles {
                for listener in &mut self.listeners.destruction {
                    listener.destroyed(Destroyed::Joint(handle));
                }
            }
            let body_handles: Vec<BodyHandle> = self.bodies.iter().map(|(h, _)| h).collect();
            for handle in body_handles {
                for listener in &mut self.listeners.destruction {
                    listener.destroyed(Destroyed::Body(handle));
                }
            }
        }
        self.joints.clear();
        self.bodies.clear();
        self.collisions.clear();
        self.pipeline.mark_update_required();
        Ok(())
    }

    // -- configuration -----------------------------------------------------

    pub fn set_bounds(&mut self, bounds: Option<Aabb>) {
        self.bounds = bounds;
    }

    pub fn set_gravity(&mut self, gravity: Vector) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> Vector {
        self.gravity
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_value_mixer(&mut self, mixer: Box<dyn ValueMixer>) {
        self.value_mixer = mixer;
    }

    pub fn set_broadphase_filter(&mut self, filter: Box<dyn BroadPhaseFilter>) {
        self.broadphase_filter = filter;
    }

    pub fn set_narrow_phase_post_processor(&mut self, post_processor: Box<dyn NarrowPhasePostProcessor>) {
        self.narrow_phase_post_processor = post_processor;
    }

    // -- stepping ------------------------------------------------------

    fn step_once(&mut self, dt: Real) {
        self.dispatching = true;
        self.pipeline.step(
            dt,
            &mut self.bodies,
            &mut self.joints,
            &mut self.collisions,
            self.gravity,
            &self.settings,
            self.bounds.as_ref(),
            self.broadphase_filter.as_ref(),
            self.narrow_phase_post_processor.as_ref(),
            self.value_mixer.as_ref(),
            &mut self.listeners,
        );
        self.dispatching = false;
    }

    /// Runs the detection sub-pipeline immediately, without a full step (no
    /// velocity/position integration, no CCD). Useful right after adding or
    /// removing bodies mid-frame, to make [`World::is_in_contact`] and
    /// [`World::get_contacts`] reflect the world's current poses before the
    /// next scheduled step.
    pub fn refresh_contacts(&mut self) {
        self.dispatching = true;
        self.pipeline.run_detection(
            &mut self.bodies,
            &self.joints,
            &mut self.collisions,
            self.bounds.as_ref(),
            self.broadphase_filter.as_ref(),
            self.narrow_phase_post_processor.as_ref(),
            self.value_mixer.as_ref(),
            &mut self.listeners,
        );
        self.dispatching = false;
    }

    /// Advances by exactly `dt`, ignoring the accumulator.
    pub fn updatev(&mut self, dt: Real) {
        self.step_once(dt);
    }

    /// Runs `steps` fixed steps at `settings.step_frequency`.
    pub fn step(&mut self, steps: u32) {
        let dt = self.settings.step_frequency;
        for _ in 0..steps {
            self.step_once(dt);
        }
    }

    /// Runs `steps` fixed steps of `dt` each, regardless of
    /// `settings.step_frequency`.
    pub fn step_with_dt(&mut self, steps: u32, dt: Real) {
        for _ in 0..steps {
            self.step_once(dt);
        }
    }

    /// Accumulates `elapsed` and runs as many `settings.step_frequency`
    /// steps as it covers. Returns whether at least one step ran.
    pub fn update(&mut self, elapsed: Real) -> bool {
        self.update_with_step(elapsed, self.settings.step_frequency, u32::MAX)
    }

    /// Like [`World::update`], but never runs more than `max_steps` in one
    /// call (excess elapsed time is simply dropped from the accumulator).
    pub fn update_bounded(&mut self, elapsed: Real, max_steps: u32) -> bool {
        self.update_with_step(elapsed, self.settings.step_frequency, max_steps)
    }

    /// Like [`World::update_bounded`], but with an explicit step size
    /// instead of `settings.step_frequency`.
    pub fn update_with_step(&mut self, elapsed: Real, step_dt: Real, max_steps: u32) -> bool {
        if step_dt <= 0.0 {
            return false;
        }
        self.accumulator += elapsed;
        let mut steps_taken = 0;
        while self.accumulator >= step_dt && steps_taken < max_steps {
            self.step_once(step_dt);
            self.accumulator -= step_dt;
            steps_taken += 1;
        }
        steps_taken > 0
    }

    // -- queries -------------------------------------------------------

    /// Raycast against every live fixture, returning every hit (unordered).
    pub fn raycast(&self, origin: Point, dir: Vector, max_toi: Real) -> Vec<RayHit> {
        let candidates = raycast_candidates(self.bodies.broad_phase(), origin, dir, max_toi);
        candidates
            .into_iter()
            .filter_map(|handle| {
                let (body, fixture) = self.fixture_of(handle)?;
                raycast_shape(fixture.shape.as_ref(), &body.transform, origin, dir, max_toi).map(|toi| RayHit {
                    fixture: handle,
                    toi,
                    point: origin + dir * toi,
                })
            })
            .collect()
    }

    pub fn raycast_closest(&self, origin: Point, dir: Vector, max_toi: Real) -> Option<RayHit> {
        let fixtures: Vec<(FixtureHandle, &dyn Shape, &Isometry)> = self
            .bodies
            .iter()
            .flat_map(|(body_handle, body)| {
                body.live_fixtures()
                    .map(move |(id, fixture)| ((body_handle, id), fixture.shape.as_ref(), &body.transform))
            })
            .collect();
        raycast_closest(fixtures.into_iter(), origin, dir, max_toi)
    }

    /// Sweeps `shape` from `start` along `linear_velocity` over `[0, max_toi]`
    /// seconds, against every live fixture, returning every fixture touched
    /// and its time of impact (unordered).
    pub fn convex_cast(&self, shape: &dyn Shape, start: Isometry, linear_velocity: Vector, max_toi: Real) -> Vec<(FixtureHandle, Real)> {
        let motion = MotionSweep {
            start,
            linvel: linear_velocity,
            angvel: 0.0,
            dt: max_toi,
        };
        let bound = shape.local_aabb_extents().1.coords.norm() + shape.radius();
        self.bodies
            .iter()
            .flat_map(|(body_handle, body)| {
                body.live_fixtures().filter_map(move |(id, fixture)| {
                    let other_bound = fixture.shape.local_aabb_extents().1.coords.norm() + fixture.shape.radius();
                    let other_motion = MotionSweep {
                        start: body.transform,
                        linvel: Vector::zeros(),
                        angvel: 0.0,
                        dt: max_toi,
                    };
                    time_of_impact(shape, &motion, bound, fixture.shape.as_ref(), &other_motion, other_bound, 0.0, 1.0)
                        .map(|t| ((body_handle, id), t * max_toi))
                })
            })
            .collect()
    }

    pub fn convex_cast_closest(&self, shape: &dyn Shape, start: Isometry, linear_velocity: Vector, max_toi: Real) -> Option<(FixtureHandle, Real)> {
        self.convex_cast(shape, start, linear_velocity, max_toi)
            .into_iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    fn fixture_of(&self, handle: FixtureHandle) -> Option<(&Body, &Fixture)> {
        let (body_handle, id) = handle;
        let body = self.bodies.get(body_handle)?;
        let fixture = body.fixtures.get(id as usize)?.as_ref()?;
        Some((body, fixture))
    }

    /// Every live fixture whose world-space AABB overlaps `aabb` (an
    /// instantaneous spatial query, not a tracked contact).
    pub fn detect_aabb(&self, aabb: &Aabb) -> Vec<FixtureHandle> {
        self.bodies
            .broad_phase()
            .query_aabb(aabb)
            .into_iter()
            .filter(|&handle| {
                self.fixture_of(handle)
                    .map(|(body, fixture)| Aabb::of_shape(fixture.shape.as_ref(), &body.transform).intersects(aabb))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Every live fixture that exactly overlaps `shape` posed at `pose`
    /// (broad-phase AABB query narrowed by GJK, not a tracked contact).
    pub fn detect_convex(&self, shape: &dyn Shape, pose: &Isometry) -> Vec<FixtureHandle> {
        let query_aabb = Aabb::of_shape(shape, pose);
        self.detect_aabb(&query_aabb)
            .into_iter()
            .filter(|&handle| {
                self.fixture_of(handle)
                    .map(|(body, fixture)| matches!(gjk(shape, pose, fixture.shape.as_ref(), &body.transform), GjkResult::Intersecting { .. }))
                    .unwrap_or(false)
            })
            .collect()
    }

    // -- introspection ---------------------------------------------------

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    pub fn get_body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    pub fn joints(&self) -> impl Iterator<Item = (JointHandle, &JointDef)> {
        self.joints.iter()
    }

    pub fn get_joint(&self, handle: JointHandle) -> Option<&JointDef> {
        self.joints.get(handle)
    }

    pub fn is_in_contact(&self, a: FixtureHandle, b: FixtureHandle) -> bool {
        self.collisions.get(a, b).map(CollisionData::is_manifold_collision).unwrap_or(false)
    }

    pub fn get_contacts(&self) -> impl Iterator<Item = &CollisionData> {
        self.collisions.iter().filter(|d| d.is_manifold_collision())
    }

    pub fn get_joints(&self, body: BodyHandle) -> impl Iterator<Item = (JointHandle, &JointDef)> {
        self.joints.iter().filter(move |(_, j)| j.is_member(body))
    }

    pub fn get_joined_bodies(&self, body: BodyHandle) -> Vec<BodyHandle> {
        self.joints
            .iter()
            .filter(|(_, j)| j.is_member(body))
            .map(|(_, j)| {
                let (a, b) = j.bodies();
                if a == body {
                    b
                } else {
                    a
                }
            })
            .collect()
    }

    pub fn is_joined(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.joints.iter().any(|(_, j)| {
            let (ja, jb) = j.bodies();
            (ja == a && jb == b) || (ja == b && jb == a)
        })
    }

    /// Whether fixtures belonging to `a` and `b` are allowed to generate
    /// contacts, given every joint currently connecting them (any joint
    /// that disallows collision between the pair vetoes it).
    pub fn is_joint_collision_allowed(&self, a: BodyHandle, b: BodyHandle) -> bool {
        !is_joint_collision_blocked(&self.joints, a, b)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::fixture::FixtureBuilder;
    use crate::dynamics::joint::DistanceJoint;
    use crate::dynamics::rigid_body::{BodyType, RigidBodyBuilder};
    use crate::geometry::shape::Polygon;

    #[test]
    fn removing_a_body_cascades_to_its_joints() {
        let mut world = World::new();
        let a = world.add_body(Body::new(BodyType::Dynamic)).unwrap();
        let b = world.add_body(Body::new(BodyType::Dynamic)).unwrap();
        let joint = world.add_joint(JointDef::Distance(DistanceJoint::new(a, b, Point::origin(), Point::origin(), 1.0))).unwrap();

        world.remove_body(a, false).unwrap();

        assert!(world.get_joint(joint).is_none());
        assert!(world.get_body(a).is_none());
        assert!(world.get_body(b).is_some());
    }

    #[test]
    fn adding_a_joint_with_an_unknown_body_fails() {
        let mut world = World::new();
        let a = world.add_body(Body::new(BodyType::Dynamic)).unwrap();

        // A handle to a body removed from this same world: same slot, stale
        // generation, so it no longer names a member.
        let stray = world.add_body(Body::new(BodyType::Dynamic)).unwrap();
        world.remove_body(stray, false).unwrap();

        let result = world.add_joint(JointDef::Distance(DistanceJoint::new(a, stray, Point::origin(), Point::origin(), 1.0)));
        assert_eq!(result, Err(PhysicsError::MembershipViolation));
    }

    #[test]
    fn a_falling_box_eventually_settles_through_world_update() {
        let mut world = World::new();
        world.add_body(
            RigidBodyBuilder::new(BodyType::Static)
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(5.0, 0.5))).build())
                .build(),
        )
        .unwrap();
        let falling = world
            .add_body(
                RigidBodyBuilder::new(BodyType::Dynamic)
                    .translation(Vector::new(0.0, 1.05))
                    .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
                    .build(),
            )
            .unwrap();

        for _ in 0..180 {
            world.updatev(1.0 / 60.0);
        }

        let body = world.get_body(falling).unwrap();
        assert!(body.transform.translation.vector.y > 0.5);
    }
}
