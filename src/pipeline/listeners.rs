//! Every callback hook the per-step orchestration dispatches to, fired
//! synchronously on the caller's thread at the points documented on
//! [`crate::pipeline::PhysicsPipeline::step`]. All methods default to a
//! no-op (or, for veto hooks, "allow"), so a listener only needs to
//! override what it cares about.

use crate::dynamics::joint::JointHandle;
use crate::dynamics::rigid_body_set::BodyHandle;
use crate::geometry::collision_data::FixtureHandle;
use crate::geometry::contact_id::ContactId;
use crate::math::Real;

/// Fired around the fixed-step boundary and the detection/solve stages.
pub trait StepListener {
    fn begin(&mut self, _dt: Real) {}
    fn update_performed(&mut self, _dt: Real) {}
    fn post_solve(&mut self, _dt: Real) {}
    fn end(&mut self, _dt: Real) {}
}

/// One veto hook per detection stage, plus a confirmation fired once a pair
/// reaches a contact constraint. Returning `false` from a veto hook drops
/// the pair for this tick without advancing it further.
pub trait CollisionListener {
    fn broad_phase(&mut self, _fixture_a: FixtureHandle, _fixture_b: FixtureHandle) -> bool {
        true
    }
    fn narrow_phase(&mut self, _fixture_a: FixtureHandle, _fixture_b: FixtureHandle) -> bool {
        true
    }
    fn manifold(&mut self, _fixture_a: FixtureHandle, _fixture_b: FixtureHandle) -> bool {
        true
    }
    fn collision(&mut self, _fixture_a: FixtureHandle, _fixture_b: FixtureHandle) {}
}

/// Per-pair, per-point contact lifecycle events, plus the pre/post-solve
/// hooks fired once per pair around the island solve.
pub trait ContactListener {
    fn begin(&mut self, _pair: (FixtureHandle, FixtureHandle), _point: ContactId) {}
    fn persist(&mut self, _pair: (FixtureHandle, FixtureHandle), _point: ContactId) {}
    fn end(&mut self, _pair: (FixtureHandle, FixtureHandle), _point: ContactId) {}
    fn pre_solve(&mut self, _pair: (FixtureHandle, FixtureHandle)) {}
    fn post_solve(&mut self, _pair: (FixtureHandle, FixtureHandle)) {}
    fn collision(&mut self, _pair: (FixtureHandle, FixtureHandle)) {}
    fn destroyed(&mut self, _pair: (FixtureHandle, FixtureHandle)) {}
}

/// Fired when a body's fixtures leave the world bounds entirely.
pub trait BoundsListener {
    fn outside(&mut self, _body: BodyHandle) {}
}

/// What `DestructionListener::destroyed` reports was removed.
pub enum Destroyed {
    Body(BodyHandle),
    Joint(JointHandle),
    ContactConstraint(FixtureHandle, FixtureHandle),
}

/// Fired once per removed body, joint, or contact constraint, including the
/// cascaded removals triggered by removing a body.
pub trait DestructionListener {
    fn destroyed(&mut self, _what: Destroyed) {}
}

/// Veto hooks for continuous collision detection, at decreasing
/// granularity: whether to consider a body pair at all, a fixture pair
/// within it, and a final notification once a time of impact is resolved
/// and applied.
pub trait TimeOfImpactListener {
    fn allow_body_pair(&mut self, _a: BodyHandle, _b: BodyHandle) -> bool {
        true
    }
    fn allow_fixture_pair(&mut self, _a: FixtureHandle, _b: FixtureHandle) -> bool {
        true
    }
    fn resolved(&mut self, _a: BodyHandle, _b: BodyHandle, _toi: Real) {}
}

/// The full set of listeners a world may have registered, grouped so the
/// pipeline can take one bundle instead of half a dozen separate slices.
#[derive(Default)]
pub struct ListenerSet {
    pub step: Vec<Box<dyn StepListener>>,
    pub collision: Vec<Box<dyn CollisionListener>>,
    pub contact: Vec<Box<dyn ContactListener>>,
    pub bounds: Vec<Box<dyn BoundsListener>>,
    pub destruction: Vec<Box<dyn DestructionListener>>,
    pub time_of_impact: Vec<Box<dyn TimeOfImpactListener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }
}
