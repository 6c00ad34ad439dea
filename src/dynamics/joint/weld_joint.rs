//! Weld joint: locks all relative motion between two bodies (translation
//! and rotation), the 2D analogue of a rigid fixed connection.

use nalgebra::{Matrix3, Vector3};

use crate::dynamics::joint::{Joint, JointBase};
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::math::{Point, Real, Vector};
use crate::utils::cross_scalar_vector;

pub struct WeldJoint {
    base: JointBase,
    pub local_anchor_a: Point,
    pub local_anchor_b: Point,
    reference_angle: Real,

    impulse: Vector3<Real>,
    effective_mass: Matrix3<Real>,
}

impl WeldJoint {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, local_anchor_a: Point, local_anchor_b: Point, reference_angle: Real) -> Self {
        WeldJoint {
            base: JointBase::new(body_a, body_b),
            local_anchor_a,
            local_anchor_b,
            reference_angle,
            impulse: Vector3::zeros(),
            effective_mass: Matrix3::identity(),
        }
    }

    fn anchor_state(&self, bodies: &RigidBodySet) -> Option<(Vector, Vector, Vector, Real)> {
        let (a, b) = self.bodies();
        let body_a = bodies.get(a)?;
        let body_b = bodies.get(b)?;
        let world_a = body_a.transform * self.local_anchor_a;
        let world_b = body_b.transform * self.local_anchor_b;
        let ra = world_a - body_a.world_center();
        let rb = world_b - body_b.world_center();
        let angle_a = body_a.transform.rotation.angle();
        let angle_b = body_b.transform.rotation.angle();
        let angle_error = angle_b - angle_a - self.reference_angle;
        Some((ra, rb, world_b - world_a, angle_error))
    }
}

fn weld_k_matrix(inv_mass_a: Real, inv_mass_b: Real, inv_ia: Real, inv_ib: Real, ra: Vector, rb: Vector) -> Matrix3<Real> {
    let mass = inv_mass_a + inv_mass_b;
    let k11 = mass + inv_ia * ra.y * ra.y + inv_ib * rb.y * rb.y;
    let k12 = -inv_ia * ra.x * ra.y - inv_ib * rb.x * rb.y;
    let k13 = -inv_ia * ra.y - inv_ib * rb.y;
    let k22 = mass + inv_ia * ra.x * ra.x + inv_ib * rb.x * rb.x;
    let k23 = inv_ia * ra.x + inv_ib * rb.x;
    let k33 = inv_ia + inv_ib;
    Matrix3::new(k11, k12, k13, k12, k22, k23, k13, k23, k33)
}

impl Joint for WeldJoint {
    fn base(&self) -> &JointBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JointBase {
        &mut self.base
    }

    fn initialize_constraints(&mut self, bodies: &mut RigidBodySet, _params: &IntegrationParameters) {
        let Some((ra, rb, _, _)) = self.anchor_state(bodies) else {
            return;
        };
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };

        let k = weld_k_matrix(body_a.inverse_mass, body_b.inverse_mass, body_a.inverse_inertia, body_b.inverse_inertia, ra, rb);
        self.effective_mass = k.try_inverse().unwrap_or_else(Matrix3::identity);

        let p = Vector::new(self.impulse.x, self.impulse.y);
        let angular = self.impulse.z;
        body_a.linear_velocity -= p * body_a.inverse_mass;
        body_a.angular_velocity -= body_a.inverse_inertia * (crate::utils::cross(ra, p) + angular);
        body_b.linear_velocity += p * body_b.inverse_mass;
        body_b.angular_velocity += body_b.inverse_inertia * (crate::utils::cross(rb, p) + angular);
    }

    fn solve_velocity_constraints(&mut self, bodies: &mut RigidBodySet, _params: &IntegrationParameters) {
        let Some((ra, rb, _, _)) = self.anchor_state(bodies) else {
            return;
        };
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };

        let cdot_linear = (body_b.linear_velocity + cross_scalar_vector(body_b.angular_velocity, rb))
            - (body_a.linear_velocity + cross_scalar_vector(body_a.angular_velocity, ra));
        let cdot_angular = body_b.angular_velocity - body_a.angular_velocity;
        let cdot = Vector3::new(cdot_linear.x, cdot_linear.y, cdot_angular);

        let impulse = self.effective_mass * (-cdot);
        self.impulse += impulse;

        let p = Vector::new(impulse.x, impulse.y);
        let angular = impulse.z;
        body_a.linear_velocity -= p * body_a.inverse_mass;
        body_a.angular_velocity -= body_a.inverse_inertia * (crate::utils::cross(ra, p) + angular);
        body_b.linear_velocity += p * body_b.inverse_mass;
        body_b.angular_velocity += body_b.inverse_inertia * (crate::utils::cross(rb, p) + angular);
    }

    fn solve_position_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) -> bool {
        let Some((ra, rb, separation, angle_error)) = self.anchor_state(bodies) else {
            return true;
        };
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return true;
        };

        let k = weld_k_matrix(body_a.inverse_mass, body_b.inverse_mass, body_a.inverse_inertia, body_b.inverse_inertia, ra, rb);
        let inv_k = k.try_inverse().unwrap_or_else(Matrix3::identity);
        let c = Vector3::new(-separation.x, -separation.y, -angle_error);
        let impulse = inv_k * c;

        let p = Vector::new(impulse.x, impulse.y);
        let angular = impulse.z;
        body_a.transform.translation.vector -= p * body_a.inverse_mass;
        let new_angle_a = body_a.transform.rotation.angle() - body_a.inverse_inertia * angular;
        body_a.transform.rotation = crate::math::Rotation::new(new_angle_a);

        body_b.transform.translation.vector += p * body_b.inverse_mass;
        let new_angle_b = body_b.transform.rotation.angle() + body_b.inverse_inertia * angular;
        body_b.transform.rotation = crate::math::Rotation::new(new_angle_b);

        c.norm() < params.linear_slop && angle_error.abs() < params.angular_slop
    }

    fn shift(&mut self, _v: Vector) {}
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::rigid_body::{Body, BodyType};

    #[test]
    fn locks_relative_linear_velocity() {
        let mut bodies = RigidBodySet::new();
        let mut a = Body::new(BodyType::Static);
        a.recompute_mass();
        let ha = bodies.insert(a);

        let mut b = Body::new(BodyType::Dynamic);
        b.mass = 1.0;
        b.inverse_mass = 1.0;
        b.inertia = 1.0;
        b.inverse_inertia = 1.0;
        b.linear_velocity = Vector::new(2.0, -1.0);
        let hb = bodies.insert(b);

        let mut joint = WeldJoint::new(ha, hb, Point::origin(), Point::origin(), 0.0);
        let params = IntegrationParameters::from_settings(1.0 / 60.0, &crate::dynamics::solver::Settings::default());
        joint.initialize_constraints(&mut bodies, &params);
        joint.solve_velocity_constraints(&mut bodies, &params);

        let top = bodies.get(hb).unwrap();
        assert!(top.linear_velocity.norm() < 2.0_f32.hypot(1.0));
    }
}
