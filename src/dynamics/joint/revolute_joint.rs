//! Revolute (pin) joint: locks the relative translation of two anchor
//! points, leaving relative rotation free.

use nalgebra::Matrix2;

use crate::dynamics::joint::{Joint, JointBase};
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::math::{Point, Real, Vector};
use crate::utils::cross_scalar_vector;

pub struct RevoluteJoint {
    base: JointBase,
    pub local_anchor_a: Point,
    pub local_anchor_b: Point,

    impulse: Vector,
    effective_mass: Matrix2<Real>,
}

impl RevoluteJoint {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, local_anchor_a: Point, local_anchor_b: Point) -> Self {
        RevoluteJoint {
            base: JointBase::new(body_a, body_b),
            local_anchor_a,
            local_anchor_b,
            impulse: Vector::zeros(),
            effective_mass: Matrix2::identity(),
        }
    }

    fn anchor_offsets(&self, bodies: &RigidBodySet) -> Option<(Vector, Vector, Vector)> {
        let (a, b) = self.bodies();
        let body_a = bodies.get(a)?;
        let body_b = bodies.get(b)?;
        let world_a = body_a.transform * self.local_anchor_a;
        let world_b = body_b.transform * self.local_anchor_b;
        let ra = world_a - body_a.world_center();
        let rb = world_b - body_b.world_center();
        Some((ra, rb, world_b - world_a))
    }
}

fn k_matrix(inv_mass_a: Real, inv_mass_b: Real, inv_ia: Real, inv_ib: Real, ra: Vector, rb: Vector) -> Matrix2<Real> {
    let k11 = inv_mass_a + inv_mass_b + inv_ia * ra.y * ra.y + inv_ib * rb.y * rb.y;
    let k12 = -inv_ia * ra.x * ra.y - inv_ib * rb.x * rb.y;
    let k22 = inv_mass_a + inv_mass_b + inv_ia * ra.x * ra.x + inv_ib * rb.x * rb.x;
    Matrix2::new(k11, k12, k12, k22)
}

impl Joint for RevoluteJoint {
    fn base(&self) -> &JointBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JointBase {
        &mut self.base
    }

    fn initialize_constraints(&mut self, bodies: &mut RigidBodySet, _params: &IntegrationParameters) {
        let Some((ra, rb, _)) = self.anchor_offsets(bodies) else {
            return;
        };
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };

        let k = k_matrix(body_a.inverse_mass, body_b.inverse_mass, body_a.inverse_inertia, body_b.inverse_inertia, ra, rb);
        self.effective_mass = k.try_inverse().unwrap_or_else(Matrix2::identity);

        let p = self.impulse;
        body_a.linear_velocity -= p * body_a.inverse_mass;
        body_a.angular_velocity -= body_a.inverse_inertia * crate::utils::cross(ra, p);
        body_b.linear_velocity += p * body_b.inverse_mass;
        body_b.angular_velocity += body_b.inverse_inertia * crate::utils::cross(rb, p);
    }

    fn solve_velocity_constraints(&mut self, bodies: &mut RigidBodySet, _params: &IntegrationParameters) {
        let Some((ra, rb, _)) = self.anchor_offsets(bodies) else {
            return;
        };
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return;
        };

        let cdot = (body_b.linear_velocity + cross_scalar_vector(body_b.angular_velocity, rb))
            - (body_a.linear_velocity + cross_scalar_vector(body_a.angular_velocity, ra));
        let impulse = self.effective_mass * (-cdot);
        self.impulse += impulse;

        body_a.linear_velocity -= impulse * body_a.inverse_mass;
        body_a.angular_velocity -= body_a.inverse_inertia * crate::utils::cross(ra, impulse);
        body_b.linear_velocity += impulse * body_b.inverse_mass;
        body_b.angular_velocity += body_b.inverse_inertia * crate::utils::cross(rb, impulse);
    }

    fn solve_position_constraints(&mut self, bodies: &mut RigidBodySet, params: &IntegrationParameters) -> bool {
        let Some((ra, rb, separation)) = self.anchor_offsets(bodies) else {
            return true;
        };
        let (a, b) = self.bodies();
        let (body_a, body_b) = bodies.get2_mut(a, b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return true;
        };

        let k = k_matrix(body_a.inverse_mass, body_b.inverse_mass, body_a.inverse_inertia, body_b.inverse_inertia, ra, rb);
        let inv_k = k.try_inverse().unwrap_or_else(Matrix2::identity);
        let c = -separation;
        let impulse = inv_k * c;

        body_a.transform.translation.vector -= impulse * body_a.inverse_mass;
        body_b.transform.translation.vector += impulse * body_b.inverse_mass;

        c.norm() < params.linear_slop
    }

    fn shift(&mut self, _v: Vector) {}
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::rigid_body::{Body, BodyType};

    #[test]
    fn velocity_solve_zeros_relative_anchor_velocity() {
        let mut bodies = RigidBodySet::new();
        let mut a = Body::new(BodyType::Static);
        a.recompute_mass();
        let ha = bodies.insert(a);

        let mut b = Body::new(BodyType::Dynamic);
        b.mass = 1.0;
        b.inverse_mass = 1.0;
        b.inertia = 1.0;
        b.inverse_inertia = 1.0;
        b.linear_velocity = Vector::new(5.0, 0.0);
        b.transform.translation.vector = Vector::new(1.0, 0.0);
        let hb = bodies.insert(b);

        let mut joint = RevoluteJoint::new(ha, hb, Point::new(1.0, 0.0), Point::origin());
        let params = IntegrationParameters::from_settings(1.0 / 60.0, &crate::dynamics::solver::Settings::default());
        joint.initialize_constraints(&mut bodies, &params);
        joint.solve_velocity_constraints(&mut bodies, &params);

        let top = bodies.get(hb).unwrap();
        assert!(top.linear_velocity.norm() < 5.0);
    }
}
