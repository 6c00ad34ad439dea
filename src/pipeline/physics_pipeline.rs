//! The per-step orchestration: detection, island solving, and continuous
//! collision detection, wired together into the fixed sequence a caller's
//! `update`/`step` call drives. This structure only holds workspace
//! buffers (the constraint graph scratch space, the transient "confirmed
//! this tick" pair list, the CCD broad-phase) — it can be dropped and
//! replaced at any time without losing simulation state, which all lives on
//! `RigidBodySet`/`JointSet`/`CollisionDataMap`.

use std::collections::HashSet;

use crate::counters::Counters;
use crate::dynamics::ccd::CcdSolver;
use crate::dynamics::graph::{extract_islands, ConstraintGraph};
use crate::dynamics::joint::{Joint, JointSet};
use crate::dynamics::rigid_body::BodyFlags;
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::island_solver::solve_island;
use crate::dynamics::solver::{ContinuousDetectionMode, IntegrationParameters, Settings};
use crate::geometry::aabb::Aabb;
use crate::geometry::collision_data::{CollisionDataMap, FixtureHandle, PairKey};
use crate::geometry::contact_constraint::ContactConstraint;
use crate::geometry::manifold::build_manifold;
use crate::geometry::narrow_phase::{test_pair, NarrowPhasePostProcessor, NarrowPhaseResult};
use crate::geometry::value_mixer::ValueMixer;
use crate::math::{Real, Vector};
use crate::pipeline::listeners::ListenerSet;

/// A user-installable veto over which fixture pairs are even worth a
/// narrow-phase test, checked alongside each `CollisionListener`'s own
/// broad-phase hook. Default: allow everything (the built-in category/mask
/// filter on `Fixture` and joint collision-allowance are applied regardless
/// of this hook).
pub trait BroadPhaseFilter: Send + Sync {
    fn filter(&self, fixture_a: FixtureHandle, fixture_b: FixtureHandle) -> bool {
        let _ = (fixture_a, fixture_b);
        true
    }
}

#[derive(Default)]
pub struct DefaultBroadPhaseFilter;
impl BroadPhaseFilter for DefaultBroadPhaseFilter {}

pub(crate) fn is_joint_collision_blocked(joints: &JointSet, a: BodyHandle, b: BodyHandle) -> bool {
    joints.iter().any(|(_, joint)| {
        let (ja, jb) = joint.bodies();
        ((ja == a && jb == b) || (ja == b && jb == a)) && !joint.is_collision_allowed()
    })
}

/// Drives one fixed step (or one detection-only pass) over a world's bodies,
/// joints and collision data.
pub struct PhysicsPipeline {
    pub counters: Counters,
    update_required: bool,
    graph: ConstraintGraph,
    ccd: CcdSolver,
    /// Non-sensor, enabled, manifold-confirmed pairs from the most recent
    /// detection pass, read by the pre/post-solve dispatch around the
    /// island solve.
    contact_collisions: Vec<(FixtureHandle, FixtureHandle)>,
}

impl Default for PhysicsPipeline {
    fn default() -> Self {
        PhysicsPipeline::new()
    }
}

impl PhysicsPipeline {
    pub fn new() -> Self {
        PhysicsPipeline {
            counters: Counters::new(false),
            update_required: true,
            graph: ConstraintGraph::new(),
            ccd: CcdSolver::new(),
            contact_collisions: Vec::new(),
        }
    }

    /// Requests a detection pass at the start of the next `step`, even if
    /// one already ran this tick. Callers that add/remove bodies, fixtures
    /// or joints outside of `step` should call this so stale pair state
    /// isn't solved against.
    pub fn mark_update_required(&mut self) {
        self.update_required = true;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        dt: Real,
        bodies: &mut RigidBodySet,
        joints: &mut JointSet,
        collisions: &mut CollisionDataMap,
        gravity: Vector,
        settings: &Settings,
        bounds: Option<&Aabb>,
        broadphase_filter: &dyn BroadPhaseFilter,
        narrow_phase_post_processor: &dyn NarrowPhasePostProcessor,
        value_mixer: &dyn ValueMixer,
        listeners: &mut ListenerSet,
    ) {
        let params = IntegrationParameters::from_settings(dt, settings);

        for listener in &mut listeners.step {
            listener.begin(dt);
        }

        if self.update_required {
            self.run_detection(bodies, joints, collisions, bounds, broadphase_filter, narrow_phase_post_processor, value_mixer, listeners);
            for listener in &mut listeners.step {
                listener.update_performed(dt);
            }
            self.update_required = false;
        }

        for &pair in &self.contact_collisions {
            for listener in &mut listeners.contact {
                listener.pre_solve(pair);
            }
        }

        self.counters.stages.island_construction_time.resume();
        self.graph.rebuild(collisions, joints);
        let islands = extract_islands(&self.graph, bodies);
        self.counters.stages.island_construction_time.pause();

        self.counters.stages.solver_time.resume();
        for island in &islands {
            solve_island(island, bodies, joints, collisions, gravity, settings, &params);
        }
        self.counters.stages.solver_time.pause();

        for &pair in &self.contact_collisions {
            for listener in &mut listeners.contact {
                listener.post_solve(pair);
            }
        }
        for listener in &mut listeners.step {
            listener.post_solve(dt);
        }

        self.counters.stages.ccd_time.resume();
        if settings.continuous_detection_mode != ContinuousDetectionMode::None {
            self.ccd.solve(bodies, joints, collisions, settings.continuous_detection_mode, dt, &mut listeners.time_of_impact);
        }
        self.counters.stages.ccd_time.pause();

        // Refresh contacts so the caller's own post-step inspection (and
        // next tick's pre-solve dispatch) sees this step's actual motion.
        self.run_detection(bodies, joints, collisions, bounds, broadphase_filter, narrow_phase_post_processor, value_mixer, listeners);
        self.update_required = false;

        for listener in &mut listeners.step {
            listener.end(dt);
        }
    }

    /// Runs the detection sub-pipeline on demand, outside of `step`'s usual
    /// schedule (e.g. right after adding bodies mid-frame, before the next
    /// fixed step runs).
    #[allow(clippy::too_many_arguments)]
    pub fn run_detection(
        &mut self,
        bodies: &mut RigidBodySet,
        joints: &JointSet,
        collisions: &mut CollisionDataMap,
        bounds: Option<&Aabb>,
        broadphase_filter: &dyn BroadPhaseFilter,
        narrow_phase_post_processor: &dyn NarrowPhasePostProcessor,
        value_mixer: &dyn ValueMixer,
        listeners: &mut ListenerSet,
    ) {
        self.counters.stages.collision_detection_time.resume();

        // a. bounds check: bodies whose every live fixture has left the
        // bounds entirely are disabled and reported.
        if let Some(bounds) = bounds {
            let outside: Vec<BodyHandle> = bodies
                .iter()
                .filter(|(_, body)| body.is_enabled())
                .filter(|(_, body)| {
                    let mut any_fixture = false;
                    let all_outside = body.live_fixtures().all(|(_, fixture)| {
                        any_fixture = true;
                        !Aabb::of_shape(fixture.shape.as_ref(), &body.transform).intersects(bounds)
                    });
                    any_fixture && all_outside
                })
                .map(|(handle, _)| handle)
                .collect();
            for handle in outside {
                if let Some(body) = bodies.get_mut(handle) {
                    body.flags.remove(BodyFlags::ENABLED);
                }
                for listener in &mut listeners.bounds {
                    listener.outside(handle);
                }
            }
        }

        // b. broad-phase update, then seed fresh `CollisionData` for every
        // newly overlapping pair not already tracked.
        self.counters.cd.broad_phase_time.resume();
        bodies.sync_all_fixture_aabbs();
        let new_pairs = bodies.broad_phase().detect_pairs();
        self.counters.cd.broad_phase_time.pause();
        for (a, b) in new_pairs {
            if !collisions.contains(a, b) {
                collisions.get_or_insert(a, b);
            }
        }

        // c. drain the pair map, advancing each pair as far as this tick's
        // state allows.
        self.counters.cd.narrow_phase_time.resume();
        self.contact_collisions.clear();
        let mut remove_set: HashSet<PairKey> = HashSet::new();

        for data in collisions.iter_mut() {
            data.reset_flags();
            let (body_a_handle, fixture_a_id) = data.fixture_a;
            let (body_b_handle, fixture_b_id) = data.fixture_b;

            // i. either endpoint removed since last tick.
            let fixture_alive = |handle: BodyHandle, id: u32| {
                bodies
                    .get(handle)
                    .and_then(|b| b.fixtures.get(id as usize))
                    .map(|slot| slot.is_some())
                    .unwrap_or(false)
            };
            if !fixture_alive(body_a_handle, fixture_a_id) || !fixture_alive(body_b_handle, fixture_b_id) {
                remove_set.insert(PairKey::new(data.fixture_a, data.fixture_b));
                continue;
            }

            // ii. re-test AABB overlap if either endpoint moved this tick.
            let broad_phase = bodies.broad_phase();
            if broad_phase.is_updated(data.fixture_a) || broad_phase.is_updated(data.fixture_b) {
                let still_overlapping = match (broad_phase.get_aabb(data.fixture_a), broad_phase.get_aabb(data.fixture_b)) {
                    (Some(aabb_a), Some(aabb_b)) => aabb_a.intersects(&aabb_b),
                    _ => false,
                };
                if !still_overlapping {
                    if let Some(constraint) = &mut data.contact_constraint {
                        let events = constraint.clear();
                        for listener in &mut listeners.contact {
                            for id in &events.end {
                                listener.end((data.fixture_a, data.fixture_b), *id);
                            }
                        }
                    }
                    remove_set.insert(PairKey::new(data.fixture_a, data.fixture_b));
                    continue;
                }
            }

            let body_a = bodies.get(body_a_handle).unwrap();
            let body_b = bodies.get(body_b_handle).unwrap();
            let fixture_a = body_a.fixtures[fixture_a_id as usize].as_ref().unwrap();
            let fixture_b = body_b.fixtures[fixture_b_id as usize].as_ref().unwrap();

            // iii. built-in category/mask and joint-collision filters, then
            // the user broad-phase filter and every listener's own hook.
            if !fixture_a.filter.can_collide(&fixture_b.filter) || is_joint_collision_blocked(joints, body_a_handle, body_b_handle) {
                continue;
            }
            if !broadphase_filter.filter(data.fixture_a, data.fixture_b) {
                continue;
            }
            if listeners.collision.iter_mut().any(|l| !l.broad_phase(data.fixture_a, data.fixture_b)) {
                continue;
            }
            data.flags.broadphase = true;

            // iv/v. narrow-phase, with the post-processor already applied
            // inside `test_pair`.
            let penetration = match test_pair(fixture_a.shape.as_ref(), &body_a.transform, fixture_b.shape.as_ref(), &body_b.transform, narrow_phase_post_processor) {
                NarrowPhaseResult::Penetrating(pen) if pen.depth > 0.0 => pen,
                _ => {
                    data.penetration = None;
                    continue;
                }
            };
            data.penetration = Some(penetration);

            // vi.
            if listeners.collision.iter_mut().any(|l| !l.narrow_phase(data.fixture_a, data.fixture_b)) {
                continue;
            }
            data.flags.narrowphase = true;

            // vii.
            let manifold = build_manifold(fixture_a.shape.as_ref(), &body_a.transform, fixture_b.shape.as_ref(), &body_b.transform, &penetration);
            if manifold.points.is_empty() {
                continue;
            }

            // viii.
            if listeners.collision.iter_mut().any(|l| !l.manifold(data.fixture_a, data.fixture_b)) {
                continue;
            }
            data.flags.manifold = true;
            data.manifold = Some(manifold.clone());

            // ix + d. confirmed collision: warm-start match against the
            // previous step's points, install/refresh the constraint edge.
            let constraint = data.contact_constraint.get_or_insert_with(|| ContactConstraint::new(data.fixture_a, data.fixture_b));
            constraint.friction = value_mixer.mix_friction(fixture_a.friction, fixture_b.friction);
            constraint.restitution = value_mixer.mix_restitution(fixture_a.restitution, fixture_b.restitution);
            constraint.restitution_velocity_threshold =
                value_mixer.mix_restitution_velocity_threshold(fixture_a.restitution_velocity_threshold, fixture_b.restitution_velocity_threshold);
            constraint.is_sensor = fixture_a.is_sensor || fixture_b.is_sensor;
            data.flags.contact_constraint = true;

            let events = constraint.update(&manifold);
            for listener in &mut listeners.contact {
                for id in &events.begin {
                    listener.begin((data.fixture_a, data.fixture_b), *id);
                }
                for id in &events.persist {
                    listener.persist((data.fixture_a, data.fixture_b), *id);
                }
                for id in &events.end {
                    listener.end((data.fixture_a, data.fixture_b), *id);
                }
                listener.collision((data.fixture_a, data.fixture_b));
            }
            for listener in &mut listeners.collision {
                listener.collision(data.fixture_a, data.fixture_b);
            }

            if !constraint.is_sensor && constraint.enabled {
                self.contact_collisions.push((data.fixture_a, data.fixture_b));
            }
        }

        collisions.retain(|data| !remove_set.contains(&PairKey::new(data.fixture_a, data.fixture_b)));
        bodies.broad_phase_mut().clear_updates();

        self.counters.cd.narrow_phase_time.pause();
        self.counters.stages.collision_detection_time.pause();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::fixture::FixtureBuilder;
    use crate::dynamics::rigid_body::{BodyType, RigidBodyBuilder};
    use crate::geometry::narrow_phase::IdentityPostProcessor;
    use crate::geometry::shape::Polygon;
    use crate::geometry::value_mixer::DefaultValueMixer;
    use crate::math::Point;

    fn ground_and_box() -> (RigidBodySet, BodyHandle, BodyHandle) {
        let mut bodies = RigidBodySet::new();
        let ground = bodies.insert(
            RigidBodyBuilder::new(BodyType::Static)
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(5.0, 0.5))).build())
                .build(),
        );
        let falling = bodies.insert(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .translation(Vector::new(0.0, 1.05))
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
                .build(),
        );
        (bodies, ground, falling)
    }

    #[test]
    fn falling_box_comes_to_rest_on_the_ground_over_many_steps() {
        let (mut bodies, _ground, falling) = ground_and_box();
        let mut joints = JointSet::new();
        let mut collisions = CollisionDataMap::new();
        let settings = Settings::default();
        let mut pipeline = PhysicsPipeline::new();
        let mut listeners = ListenerSet::new();

        for _ in 0..180 {
            pipeline.step(
                1.0 / 60.0,
                &mut bodies,
                &mut joints,
                &mut collisions,
                Vector::new(0.0, -9.8),
                &settings,
                None,
                &DefaultBroadPhaseFilter,
                &IdentityPostProcessor,
                &DefaultValueMixer,
                &mut listeners,
            );
        }

        let body = bodies.get(falling).unwrap();
        assert!(body.transform.translation.vector.y > 0.5, "box should rest above the ground, not fall through it");
        assert!(body.linear_velocity.norm() < 1.0);
    }

    #[test]
    fn body_entirely_outside_bounds_is_disabled_and_reported() {
        struct Recorder {
            seen: std::cell::RefCell<Vec<BodyHandle>>,
        }
        impl crate::pipeline::listeners::BoundsListener for Recorder {
            fn outside(&mut self, body: BodyHandle) {
                self.seen.borrow_mut().push(body);
            }
        }

        let mut bodies = RigidBodySet::new();
        let far_away = bodies.insert(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .translation(Vector::new(1000.0, 1000.0))
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
                .build(),
        );
        let mut joints = JointSet::new();
        let mut collisions = CollisionDataMap::new();
        let settings = Settings::default();
        let mut pipeline = PhysicsPipeline::new();
        let mut listeners = ListenerSet::new();
        listeners.bounds.push(Box::new(Recorder { seen: std::cell::RefCell::new(Vec::new()) }));

        let bounds = Aabb::new(Point::new(-10.0, -10.0), Point::new(10.0, 10.0));
        pipeline.step(
            1.0 / 60.0,
            &mut bodies,
            &mut joints,
            &mut collisions,
            Vector::zeros(),
            &settings,
            Some(&bounds),
            &DefaultBroadPhaseFilter,
            &IdentityPostProcessor,
            &DefaultValueMixer,
            &mut listeners,
        );

        assert!(!bodies.get(far_away).unwrap().is_enabled());
    }
}
