//! Mouse joint: a soft point constraint dragging one body's anchor toward a
//! moving world-space target, used by authoring tools for interactive
//! dragging. Modeled as a spring-damper rather than a rigid constraint so
//! dragging doesn't fight the solver.

use nalgebra::Matrix2;

use crate::data::arena::Index;
use crate::dynamics::joint::{Joint, JointBase};
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::math::{Point, Real, Vector};
use crate::utils::cross_scalar_vector;

pub struct MouseJoint {
    base: JointBase,
    pub local_anchor: Point,
    pub target: Point,
    pub max_force: Real,
    pub frequency_hz: Real,
    pub damping_ratio: Real,

    gamma: Real,
    beta: Real,
    impulse: Vector,
    effective_mass: Matrix2<Real>,
    anchor_offset: Vector,
}

impl MouseJoint {
    /// `body_a` is a sentinel (there is no second dragged body) so `Joint`'s
    /// two-body shape still applies uniformly.
    pub fn new(body: BodyHandle, local_anchor: Point, target: Point) -> Self {
        MouseJoint {
            base: JointBase::new(Index::invalid(), body),
            local_anchor,
            target,
            max_force: 1000.0,
            frequency_hz: 5.0,
            damping_ratio: 0.7,
            gamma: 0.0,
            beta: 0.0,
            impulse: Vector::zeros(),
            effective_mass: Matrix2::identity(),
            anchor_offset: Vector::zeros(),
        }
    }

    fn body_handle(&self) -> BodyHandle {
        self.base.body_b
    }
}

impl Joint for MouseJoint {
    fn base(&self) -> &JointBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JointBase {
        &mut self.base
    }

    fn is_member(&self, body: BodyHandle) -> bool {
        body == self.body_handle()
    }

    fn initialize_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) {
        let Some(body) = bodies.get_mut(self.body_handle()) else {
            return;
        };

        let world_anchor = body.transform * self.local_anchor;
        let ra = world_anchor - body.world_center();
        self.anchor_offset = ra;

        let k = Matrix2::new(
            body.inverse_mass + body.inverse_inertia * ra.y * ra.y,
            -body.inverse_inertia * ra.x * ra.y,
            -body.inverse_inertia * ra.x * ra.y,
            body.inverse_mass + body.inverse_inertia * ra.x * ra.x,
        );

        let omega = 2.0 * std::f32::consts::PI * self.frequency_hz;
        let inv_mass = if body.inverse_mass > 1.0e-12 { 1.0 / body.inverse_mass } else { 0.0 };
        let d = 2.0 * inv_mass * self.damping_ratio * omega;
        let spring_k = inv_mass * omega * omega;
        let h = params.dt;
        self.gamma = if h * (d + h * spring_k) > 1.0e-12 { 1.0 / (h * (d + h * spring_k)) } else { 0.0 };
        self.beta = h * spring_k * self.gamma;

        let mut k_soft = k;
        k_soft.m11 += self.gamma;
        k_soft.m22 += self.gamma;
        self.effective_mass = k_soft.try_inverse().unwrap_or_else(Matrix2::identity);

        let p = self.impulse;
        body.linear_velocity += p * body.inverse_mass;
        body.angular_velocity += body.inverse_inertia * crate::utils::cross(ra, p);
    }

    fn solve_velocity_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) {
        let Some(body) = bodies.get_mut(self.body_handle()) else {
            return;
        };
        let ra = self.anchor_offset;
        let world_anchor = body.world_center() + ra;
        let c = world_anchor - self.target;

        let cdot = body.linear_velocity + cross_scalar_vector(body.angular_velocity, ra);
        let rhs = -(cdot + c * self.beta) - self.impulse * self.gamma;
        let impulse = self.effective_mass * rhs;

        let old = self.impulse;
        self.impulse += impulse;
        let max_impulse = self.max_force * params.dt;
        if self.impulse.norm() > max_impulse && max_impulse > 0.0 {
            self.impulse = self.impulse.normalize() * max_impulse;
        }
        let applied = self.impulse - old;

        body.linear_velocity += applied * body.inverse_mass;
        body.angular_velocity += body.inverse_inertia * crate::utils::cross(ra, applied);
    }

    fn solve_position_constraints(&mut self, _bodies: &mut RigidBodySet, _params: &IntegrationParameters) -> bool {
        true
    }

    fn shift(&mut self, v: Vector) {
        self.target += v;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::rigid_body::{Body, BodyType};

    #[test]
    fn drags_body_toward_target_over_several_steps() {
        let mut bodies = RigidBodySet::new();
        let mut body = Body::new(BodyType::Dynamic);
        body.mass = 1.0;
        body.inverse_mass = 1.0;
        body.inertia = 1.0;
        body.inverse_inertia = 1.0;
        let handle = bodies.insert(body);

        let mut joint = MouseJoint::new(handle, Point::origin(), Point::new(2.0, 0.0));
        let params = IntegrationParameters::from_settings(1.0 / 60.0, &crate::dynamics::solver::Settings::default());

        let initial_distance = bodies.get(handle).unwrap().world_center().coords.norm();
        for _ in 0..30 {
            joint.initialize_constraints(&mut bodies, &params);
            joint.solve_velocity_constraints(&mut bodies, &params);
            let body = bodies.get_mut(handle).unwrap();
            body.transform.translation.vector += body.linear_velocity * params.dt;
        }
        let final_distance = (bodies.get(handle).unwrap().world_center() - Point::new(2.0, 0.0)).coords.norm();
        assert!(final_distance < initial_distance);
    }
}
