//! Rigid distance constraint: holds two anchor points at a fixed separation.

use crate::dynamics::joint::{Joint, JointBase};
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::math::{Point, Real, Vector};
use crate::utils::{cross, cross_scalar_vector};

pub struct DistanceJoint {
    base: JointBase,
    pub local_anchor_a: Point,
    pub local_anchor_b: Point,
    pub rest_length: Real,

    axis: Vector,
    effective_mass: Real,
    impulse: Real,
}

impl DistanceJoint {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, local_anchor_a: Point, local_anchor_b: Point, rest_length: Real) -> Self {
        DistanceJoint {
            base: JointBase::new(body_a, body_b),
            local_anchor_a,
            local_anchor_b,
            rest_length,
            axis: Vector::new(1.0, 0.0),
            effective_mass: 0.0,
            impulse: 0.0,
        }
    }

    pub fn builder(body_a: BodyHandle, body_b: BodyHandle) -> DistanceJointBuilder {
        DistanceJointBuilder {
            joint: DistanceJoint::new(body_a, body_b, Point::origin(), Point::origin(), 1.0),
        }
    }

    fn anchors_and_axis(&self, bodies: &RigidBodySet) -> Option<(Vector, Vector, Vector, Real)> {
        let (a, b) = self.bodies();
        let body_a = bodies.get(a)?;
        let body_b = bodies.get(b)?;
        let world_a = body_a.transform * self.local_anchor_a;
        let world_b = body_b.transform * self.local_anchor_b;
        let delta = world_b - world_a;
        let length = delta.norm();
        let axis = if length > 1.0e-9 { delta / length } else { Vector::new(1.0, 0.0) };
        let ra = world_a - body_a.world_center();
        let rb = world_b - body_b.world_center();
        Some((ra, rb, axis, length))
    }
}

pub struct DistanceJointBuilder {
    joint: DistanceJoint,
}

impl DistanceJointBuilder {
    pub fn anchors(mut self, local_anchor_a: Point, local_anchor_b: Point) -> Self {
        self.joint.local_anchor_a = local_anchor_a;
        self.joint.local_anchor_b = local_anchor_b;
        self
    }

    pub fn rest_length(mut self, length: Real) -> Self {
        self.joint.rest_length = length;
        self
    }

    pub fn collision_allowed(mut self, allowed: bool) -> Self {
        self.joint.base.collision_allowed = allowed;
        self
    }

    pub fn build(self) -> DistanceJoint {
        self.joint
    }
}

impl Joint for DistanceJoint {
    fn base(&self) -> &JointBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JointBase {
        &mut self.base
    }

    fn initialize_constraints(&mut self, bodies: &mut RigidBodySet, _params: &IntegrationParameters) {
        let Some((ra, rb, axis, _)) = self.anchors_and_axis(bodies) else {
            return;
        };
        self.axis = axis;

        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };

        let cra = cross(ra, axis);
        let crb = cross(rb, axis);
        let inv_mass_sum = body_a.inverse_mass + body_b.inverse_mass + body_a.inverse_inertia * cra * cra + body_b.inverse_inertia * crb * crb;
        self.effective_mass = if inv_mass_sum > 1.0e-12 { 1.0 / inv_mass_sum } else { 0.0 };

        let impulse = self.impulse;
        let p = axis * impulse;
        body_a.linear_velocity -= p * body_a.inverse_mass;
        body_a.angular_velocity -= body_a.inverse_inertia * cross(ra, p);
        body_b.linear_velocity += p * body_b.inverse_mass;
        body_b.angular_velocity += body_b.inverse_inertia * cross(rb, p);
    }

    fn solve_velocity_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) {
        let Some((ra, rb, axis, length)) = self.anchors_and_axis(bodies) else {
            return;
        };
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };

        let rel_vel = (body_b.linear_velocity + cross_scalar_vector(body_b.angular_velocity, rb))
            - (body_a.linear_velocity + cross_scalar_vector(body_a.angular_velocity, ra));
        let cdot = axis.dot(&rel_vel);

        let c = length - self.rest_length;
        let bias = params.baumgarte * params.inv_dt() * c;

        let impulse = -self.effective_mass * (cdot + bias);
        self.impulse += impulse;

        let p = axis * impulse;
        body_a.linear_velocity -= p * body_a.inverse_mass;
        body_a.angular_velocity -= body_a.inverse_inertia * cross(ra, p);
        body_b.linear_velocity += p * body_b.inverse_mass;
        body_b.angular_velocity += body_b.inverse_inertia * cross(rb, p);
    }

    fn solve_position_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) -> bool {
        let Some((ra, rb, axis, length)) = self.anchors_and_axis(bodies) else {
            return true;
        };
        let c = length - self.rest_length;
        let correction = crate::utils::clamp(c, -params.max_linear_correction, params.max_linear_correction);

        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return true;
        };

        let cra = cross(ra, axis);
        let crb = cross(rb, axis);
        let inv_mass_sum = body_a.inverse_mass + body_b.inverse_mass + body_a.inverse_inertia * cra * cra + body_b.inverse_inertia * crb * crb;
        if inv_mass_sum < 1.0e-12 {
            return true;
        }
        let impulse = -correction / inv_mass_sum;
        let p = axis * impulse;

        body_a.transform.translation.vector -= p * body_a.inverse_mass;
        body_b.transform.translation.vector += p * body_b.inverse_mass;

        c.abs() < params.linear_slop
    }

    fn shift(&mut self, _v: Vector) {}
}
