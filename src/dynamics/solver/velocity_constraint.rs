//! Per-contact-point sequential-impulse velocity constraints: a normal
//! impulse (non-penetration, with restitution bias) and a tangent impulse
//! (Coulomb friction, clamped to the normal impulse via the box model).

use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::geometry::contact_constraint::ContactConstraint;
use crate::math::{Real, Vector};
use crate::utils::{cross, cross_scalar_vector, orthonormal};

/// One contact point's solved quantities, rebuilt every step from the
/// current geometry and carried through the velocity-iteration loop.
struct PointConstraint {
    ra: Vector,
    rb: Vector,
    normal_mass: Real,
    tangent_mass: Real,
    velocity_bias: Real,
}

/// A contact constraint prepared for this step's velocity iterations: the
/// shared normal/tangent directions plus one [`PointConstraint`] per
/// manifold point.
pub struct ContactVelocityConstraint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    normal: Vector,
    tangent: Vector,
    friction: Real,
    restitution: Real,
    restitution_velocity_threshold: Real,
    points: Vec<PointConstraint>,
}

impl ContactVelocityConstraint {
    /// Builds the constraint's geometric terms from the current manifold and
    /// body state. Does not touch accumulated impulses; those live on
    /// `ContactConstraint::points` and are read/written directly during
    /// warm-start and solve.
    pub fn prepare(constraint: &ContactConstraint, bodies: &RigidBodySet, params: &IntegrationParameters) -> Option<Self> {
        let (body_a, _) = constraint.fixture_a;
        let (body_b, _) = constraint.fixture_b;
        let a = bodies.get(body_a)?;
        let b = bodies.get(body_b)?;

        let normal = constraint.normal;
        let tangent = orthonormal(normal);

        let mut points = Vec::with_capacity(constraint.points.len());
        for cp in &constraint.points {
            let ra = cp.point - a.world_center();
            let rb = cp.point - b.world_center();

            let rna = cross(ra, normal);
            let rnb = cross(rb, normal);
            let k_normal = a.inverse_mass + b.inverse_mass + a.inverse_inertia * rna * rna + b.inverse_inertia * rnb * rnb;
            let normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

            let rta = cross(ra, tangent);
            let rtb = cross(rb, tangent);
            let k_tangent = a.inverse_mass + b.inverse_mass + a.inverse_inertia * rta * rta + b.inverse_inertia * rtb * rtb;
            let tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

            let relative_velocity = (b.linear_velocity + cross_scalar_vector(b.angular_velocity, rb))
                - (a.linear_velocity + cross_scalar_vector(a.angular_velocity, ra));
            let closing_speed = relative_velocity.dot(&normal);
            let restitution_bias = if -closing_speed > constraint.restitution_velocity_threshold {
                -constraint.restitution * closing_speed
            } else {
                0.0
            };
            let penetration_bias = params.baumgarte * params.inv_dt() * (cp.depth - params.linear_slop).max(0.0);

            points.push(PointConstraint {
                ra,
                rb,
                normal_mass,
                tangent_mass,
                velocity_bias: restitution_bias.max(penetration_bias),
            });
        }

        Some(ContactVelocityConstraint {
            body_a,
            body_b,
            normal,
            tangent,
            friction: constraint.friction,
            restitution: constraint.restitution,
            restitution_velocity_threshold: constraint.restitution_velocity_threshold,
            points,
        })
    }

    /// Re-applies the impulses accumulated on `constraint` from the previous
    /// step (or previous iteration), so the first iteration this step starts
    /// from last step's converged solution.
    pub fn warm_start(&self, constraint: &mut ContactConstraint, bodies: &mut RigidBodySet) {
        let (a, b) = bodies.get2_mut(self.body_a, self.body_b);
        let (Some(a), Some(b)) = (a, b) else {
            return;
        };
        for (point, cp) in self.points.iter().zip(constraint.points.iter()) {
            let impulse = self.normal * cp.normal_impulse + self.tangent * cp.tangent_impulse;
            a.linear_velocity -= impulse * a.inverse_mass;
            a.angular_velocity -= a.inverse_inertia * cross(point.ra, impulse);
            b.linear_velocity += impulse * b.inverse_mass;
            b.angular_velocity += b.inverse_inertia * cross(point.rb, impulse);
        }
    }

    /// Runs one sequential-impulse sweep: friction first (clamped to the
    /// current normal impulse from the prior sweep, Box2D's ordering), then
    /// the normal impulse itself.
    pub fn solve(&self, constraint: &mut ContactConstraint, bodies: &mut RigidBodySet) {
        let (a, b) = bodies.get2_mut(self.body_a, self.body_b);
        let (Some(a), Some(b)) = (a, b) else {
            return;
        };

        for (point, cp) in self.points.iter().zip(constraint.points.iter_mut()) {
            let relative_velocity = (b.linear_velocity + cross_scalar_vector(b.angular_velocity, point.rb))
                - (a.linear_velocity + cross_scalar_vector(a.angular_velocity, point.ra));

            let tangent_speed = relative_velocity.dot(&self.tangent);
            let mut tangent_impulse = -point.tangent_mass * tangent_speed;
            let max_friction = self.friction * cp.normal_impulse;
            let old_tangent = cp.tangent_impulse;
            cp.tangent_impulse = crate::utils::clamp(old_tangent + tangent_impulse, -max_friction, max_friction);
            tangent_impulse = cp.tangent_impulse - old_tangent;

            let p_t = self.tangent * tangent_impulse;
            a.linear_velocity -= p_t * a.inverse_mass;
            a.angular_velocity -= a.inverse_inertia * cross(point.ra, p_t);
            b.linear_velocity += p_t * b.inverse_mass;
            b.angular_velocity += b.inverse_inertia * cross(point.rb, p_t);

            let relative_velocity = (b.linear_velocity + cross_scalar_vector(b.angular_velocity, point.rb))
                - (a.linear_velocity + cross_scalar_vector(a.angular_velocity, point.ra));
            let normal_speed = relative_velocity.dot(&self.normal);
            let mut normal_impulse = -point.normal_mass * (normal_speed - point.velocity_bias);
            let old_normal = cp.normal_impulse;
            cp.normal_impulse = (old_normal + normal_impulse).max(0.0);
            normal_impulse = cp.normal_impulse - old_normal;

            let p_n = self.normal * normal_impulse;
            a.linear_velocity -= p_n * a.inverse_mass;
            a.angular_velocity -= a.inverse_inertia * cross(point.ra, p_n);
            b.linear_velocity += p_n * b.inverse_mass;
            b.angular_velocity += b.inverse_inertia * cross(point.rb, p_n);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::rigid_body::{Body, BodyType};
    use crate::geometry::collision_data::FixtureHandle;
    use crate::geometry::contact_constraint::ContactPoint;
    use crate::geometry::contact_id::ContactId;
    use crate::math::Point;
    use arrayvec::ArrayVec;

    fn falling_body(vy: Real) -> Body {
        let mut body = Body::new(BodyType::Dynamic);
        body.mass = 1.0;
        body.inverse_mass = 1.0;
        body.inertia = 1.0;
        body.inverse_inertia = 1.0;
        body.linear_velocity = Vector::new(0.0, vy);
        body
    }

    fn ground() -> Body {
        let mut body = Body::new(BodyType::Static);
        body.recompute_mass();
        body
    }

    #[test]
    fn resting_contact_removes_closing_velocity() {
        let mut bodies = RigidBodySet::new();
        let ground_handle = bodies.insert(ground());
        let falling_handle = bodies.insert(falling_body(-5.0));

        let fixture_a: FixtureHandle = (ground_handle, 0);
        let fixture_b: FixtureHandle = (falling_handle, 0);
        let mut constraint = ContactConstraint::new(fixture_a, fixture_b);
        constraint.normal = Vector::new(0.0, 1.0);
        constraint.friction = 0.0;
        constraint.restitution = 0.0;
        let mut points: ArrayVec<ContactPoint, 2> = ArrayVec::new();
        points.push(ContactPoint {
            id: ContactId { reference_feature: 0, incident_feature: 0 },
            depth: 0.0,
            point: Point::origin(),
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            persisted: false,
        });
        constraint.points = points;

        let params = IntegrationParameters::from_settings(1.0 / 60.0, &crate::dynamics::solver::Settings::default());
        let prepared = ContactVelocityConstraint::prepare(&constraint, &bodies, &params).unwrap();
        prepared.solve(&mut constraint, &mut bodies);

        let body = bodies.get(falling_handle).unwrap();
        assert!(body.linear_velocity.y > -5.0);
    }

    #[test]
    fn fast_approach_above_threshold_bounces_with_restitution() {
        let mut bodies = RigidBodySet::new();
        let ground_handle = bodies.insert(ground());
        let falling_handle = bodies.insert(falling_body(-10.0));

        let fixture_a: FixtureHandle = (ground_handle, 0);
        let fixture_b: FixtureHandle = (falling_handle, 0);
        let mut constraint = ContactConstraint::new(fixture_a, fixture_b);
        constraint.normal = Vector::new(0.0, 1.0);
        constraint.friction = 0.0;
        constraint.restitution = 0.5;
        constraint.restitution_velocity_threshold = 1.0;
        let mut points: ArrayVec<ContactPoint, 2> = ArrayVec::new();
        points.push(ContactPoint {
            id: ContactId { reference_feature: 0, incident_feature: 0 },
            depth: 0.0,
            point: Point::origin(),
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            persisted: false,
        });
        constraint.points = points;

        let params = IntegrationParameters::from_settings(1.0 / 60.0, &crate::dynamics::solver::Settings::default());
        let prepared = ContactVelocityConstraint::prepare(&constraint, &bodies, &params).unwrap();
        prepared.solve(&mut constraint, &mut bodies);

        let body = bodies.get(falling_handle).unwrap();
        assert!(body.linear_velocity.y > 0.0);
    }
}
