//! Nonlinear Gauss-Seidel position correction for contacts, run after
//! velocity integration to remove residual penetration velocity integration
//! alone can't fully resolve.

use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::dynamics::solver::IntegrationParameters;
use crate::math::{Point, Real, Vector};
use crate::utils::{clamp, cross};

/// One contact point's separating geometry, recomputed fresh every position
/// iteration (unlike the velocity constraint, this has no warm-started
/// impulse state of its own).
pub struct PositionConstraint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub local_anchor_a: Point,
    pub local_anchor_b: Point,
    pub normal: Vector,
    pub separation_at_prepare: Real,
}

impl PositionConstraint {
    /// Solves one point, directly nudging both bodies' transforms. Returns
    /// the remaining separation (negative means still penetrating), which
    /// the caller uses to decide whether another iteration is worthwhile.
    pub fn solve(&self, bodies: &mut RigidBodySet, params: &IntegrationParameters) -> Real {
        let (a, b) = bodies.get2_mut(self.body_a, self.body_b);
        let (Some(a), Some(b)) = (a, b) else {
            return 0.0;
        };

        let world_a = a.transform * self.local_anchor_a;
        let world_b = b.transform * self.local_anchor_b;
        let separation = (world_b - world_a).dot(&self.normal) + self.separation_at_prepare;

        let ra = world_a - a.world_center();
        let rb = world_b - b.world_center();

        let rna = cross(ra, self.normal);
        let rnb = cross(rb, self.normal);
        let k = a.inverse_mass + b.inverse_mass + a.inverse_inertia * rna * rna + b.inverse_inertia * rnb * rnb;
        if k <= 0.0 {
            return separation;
        }

        let correction = clamp(
            params.baumgarte * (separation - params.linear_slop),
            -params.max_linear_correction,
            0.0,
        );
        let impulse = -correction / k;
        let p = self.normal * impulse;

        a.transform.translation.vector -= p * a.inverse_mass;
        let angle_a = a.transform.rotation.angle() - a.inverse_inertia * cross(ra, p);
        a.transform.rotation = crate::math::Rotation::new(angle_a);

        b.transform.translation.vector += p * b.inverse_mass;
        let angle_b = b.transform.rotation.angle() + b.inverse_inertia * cross(rb, p);
        b.transform.rotation = crate::math::Rotation::new(angle_b);

        separation
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::rigid_body::{Body, BodyType};

    #[test]
    fn overlapping_box_on_ground_is_pushed_apart() {
        let mut bodies = RigidBodySet::new();
        let mut ground = Body::new(BodyType::Static);
        ground.recompute_mass();
        let ground_handle = bodies.insert(ground);

        let mut falling = Body::new(BodyType::Dynamic);
        falling.mass = 1.0;
        falling.inverse_mass = 1.0;
        falling.inertia = 1.0;
        falling.inverse_inertia = 1.0;
        falling.transform.translation.vector = Vector::new(0.0, -0.05);
        let falling_handle = bodies.insert(falling);

        let constraint = PositionConstraint {
            body_a: ground_handle,
            body_b: falling_handle,
            local_anchor_a: Point::origin(),
            local_anchor_b: Point::origin(),
            normal: Vector::new(0.0, 1.0),
            separation_at_prepare: -0.05,
        };
        let params = IntegrationParameters::from_settings(1.0 / 60.0, &crate::dynamics::solver::Settings::default());
        for _ in 0..4 {
            constraint.solve(&mut bodies, &params);
        }

        let body = bodies.get(falling_handle).unwrap();
        assert!(body.transform.translation.vector.y > -0.05);
    }
}
