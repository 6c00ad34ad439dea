//! Friction-style joint: drains relative linear and angular velocity
//! between two bodies, clamped by a maximum force and torque. Has no
//! position constraint of its own — it only resists relative motion.

use crate::dynamics::joint::{Joint, JointBase};
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::math::{Real, Vector};

pub struct FrictionJoint {
    base: JointBase,
    pub max_force: Real,
    pub max_torque: Real,

    linear_impulse: Vector,
    angular_impulse: Real,
}

impl FrictionJoint {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, max_force: Real, max_torque: Real) -> Self {
        FrictionJoint {
            base: JointBase::new(body_a, body_b),
            max_force,
            max_torque,
            linear_impulse: Vector::zeros(),
            angular_impulse: 0.0,
        }
    }
}

impl Joint for FrictionJoint {
    fn base(&self) -> &JointBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JointBase {
        &mut self.base
    }

    fn initialize_constraints(&mut self, bodies: &mut RigidBodySet, _params: &IntegrationParameters) {
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };
        let p = self.linear_impulse;
        body_a.linear_velocity -= p * body_a.inverse_mass;
        body_a.angular_velocity -= body_a.inverse_inertia * self.angular_impulse;
        body_b.linear_velocity += p * body_b.inverse_mass;
        body_b.angular_velocity += body_b.inverse_inertia * self.angular_impulse;
    }

    fn solve_velocity_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) {
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };

        // Angular friction.
        {
            let cdot = body_b.angular_velocity - body_a.angular_velocity;
            let inv_mass_sum = body_a.inverse_inertia + body_b.inverse_inertia;
            if inv_mass_sum > 1.0e-12 {
                let mass = 1.0 / inv_mass_sum;
                let max_impulse = self.max_torque * params.dt;
                let old = self.angular_impulse;
                self.angular_impulse = crate::utils::clamp(old - mass * cdot, -max_impulse, max_impulse);
                let impulse = self.angular_impulse - old;
                body_a.angular_velocity -= body_a.inverse_inertia * impulse;
                body_b.angular_velocity += body_b.inverse_inertia * impulse;
            }
        }

        // Linear friction (anchored at each body's center of mass).
        {
            let cdot = body_b.linear_velocity - body_a.linear_velocity;
            let inv_mass_sum = body_a.inverse_mass + body_b.inverse_mass;
            if inv_mass_sum > 1.0e-12 {
                let mass = 1.0 / inv_mass_sum;
                let impulse = -cdot * mass;
                let old = self.linear_impulse;
                let max_impulse = self.max_force * params.dt;
                let combined = old + impulse;
                let clamped = if combined.norm() > max_impulse && max_impulse > 0.0 {
                    combined.normalize() * max_impulse
                } else {
                    combined
                };
                self.linear_impulse = clamped;
                let applied = clamped - old;
                body_a.linear_velocity -= applied * body_a.inverse_mass;
                body_b.linear_velocity += applied * body_b.inverse_mass;
            }
        }
    }

    fn solve_position_constraints(&mut self, _bodies: &mut RigidBodySet, _params: &IntegrationParameters) -> bool {
        true
    }

    fn shift(&mut self, _v: Vector) {}
}
