//! The joint constraint interface and the fixed family of joints built on
//! top of it: each concrete joint is a plain data struct implementing
//! [`Joint`], and [`JointDef`] is the tagged union the solver actually
//! stores and dispatches through.

pub mod distance_joint;
pub mod friction_joint;
pub mod mouse_joint;
pub mod revolute_joint;
pub mod weld_joint;

use crate::data::arena::{Arena, Index};
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::math::Vector;

pub use distance_joint::DistanceJoint;
pub use friction_joint::FrictionJoint;
pub use mouse_joint::MouseJoint;
pub use revolute_joint::RevoluteJoint;
pub use weld_joint::WeldJoint;

pub type JointHandle = Index;

/// Fields every joint carries regardless of its formulation.
#[derive(Copy, Clone, Debug)]
pub struct JointBase {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub collision_allowed: bool,
    pub enabled: bool,
}

impl JointBase {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        JointBase {
            body_a,
            body_b,
            collision_allowed: false,
            enabled: true,
        }
    }
}

/// The constraint-solver interface every joint formulation exposes.
pub trait Joint {
    fn base(&self) -> &JointBase;
    fn base_mut(&mut self) -> &mut JointBase;

    fn bodies(&self) -> (BodyHandle, BodyHandle) {
        let base = self.base();
        (base.body_a, base.body_b)
    }

    fn is_member(&self, body: BodyHandle) -> bool {
        let (a, b) = self.bodies();
        body == a || body == b
    }

    fn is_collision_allowed(&self) -> bool {
        self.base().collision_allowed
    }

    fn is_enabled(&self) -> bool {
        self.base().enabled
    }

    /// Computes per-step Jacobians, effective masses, and applies
    /// warm-start impulses from the previous step.
    fn initialize_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters);

    fn solve_velocity_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters);

    /// Nonlinear position correction; returns whether this joint's position
    /// error is within tolerance.
    fn solve_position_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) -> bool;

    /// Shifts any world-space anchor cached by the joint (e.g. a mouse
    /// target) by `v`, for long-range coordinate renormalization.
    fn shift(&mut self, v: Vector);
}

/// The closed set of joint formulations the solver dispatches over.
pub enum JointDef {
    Distance(DistanceJoint),
    Revolute(RevoluteJoint),
    Weld(WeldJoint),
    Mouse(MouseJoint),
    Friction(FrictionJoint),
}

macro_rules! dispatch {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            JointDef::Distance(j) => j.$method($($arg),*),
            JointDef::Revolute(j) => j.$method($($arg),*),
            JointDef::Weld(j) => j.$method($($arg),*),
            JointDef::Mouse(j) => j.$method($($arg),*),
            JointDef::Friction(j) => j.$method($($arg),*),
        }
    };
}

impl Joint for JointDef {
    fn base(&self) -> &JointBase {
        dispatch!(self, base)
    }

    fn base_mut(&mut self) -> &mut JointBase {
        dispatch!(self, base_mut)
    }

    fn initialize_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) {
        dispatch!(self, initialize_constraints, bodies, params)
    }

    fn solve_velocity_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) {
        dispatch!(self, solve_velocity_constraints, bodies, params)
    }

    fn solve_position_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) -> bool {
        dispatch!(self, solve_position_constraints, bodies, params)
    }

    fn shift(&mut self, v: Vector) {
        dispatch!(self, shift, v)
    }
}

/// Arena-backed storage for every joint in a world.
#[derive(Default)]
pub struct JointSet {
    joints: Arena<JointDef>,
}

impl JointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, joint: JointDef) -> JointHandle {
        self.joints.insert(joint)
    }

    pub fn remove(&mut self, handle: JointHandle) -> Option<JointDef> {
        self.joints.remove(handle)
    }

    pub fn get(&self, handle: JointHandle) -> Option<&JointDef> {
        self.joints.get(handle)
    }

    pub fn get_mut(&mut self, handle: JointHandle) -> Option<&mut JointDef> {
        self.joints.get_mut(handle)
    }

    pub fn contains(&self, handle: JointHandle) -> bool {
        self.joints.contains(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointHandle, &JointDef)> {
        self.joints.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (JointHandle, &mut JointDef)> {
        self.joints.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn clear(&mut self) {
        self.joints.clear();
    }
}
