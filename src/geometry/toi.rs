//! Conservative-advancement time-of-impact detector: the earliest
//! normalized time in `[0,1]` at which two moving convex shapes touch,
//! given each body's linear and angular velocity over the step.

use crate::geometry::gjk::{gjk, GjkResult};
use crate::geometry::shape::Shape;
use crate::math::{Isometry, Real, Rotation, Vector};

/// A body's motion over one step, used to interpolate its pose at a
/// fractional time `t ∈ [0,1]`.
#[derive(Copy, Clone, Debug)]
pub struct MotionSweep {
    pub start: Isometry,
    pub linvel: Vector,
    pub angvel: Real,
    pub dt: Real,
}

impl MotionSweep {
    pub fn at(&self, t: Real) -> Isometry {
        let dt = self.dt * t;
        let translation = self.start.translation.vector + self.linvel * dt;
        let rotation = Rotation::new(self.angvel * dt) * self.start.rotation;
        Isometry::from_parts(translation.into(), rotation)
    }

    /// Upper bound on how fast any point of the shape can move, used as the
    /// conservative-advancement step-size bound.
    fn max_point_speed(&self, shape_radius_bound: Real) -> Real {
        self.linvel.norm() + self.angvel.abs() * shape_radius_bound
    }
}

const MAX_ITERATIONS: u32 = 20;
const TARGET_DISTANCE: Real = 1.0e-4;

/// Runs conservative advancement between `shape_a` swept by `motion_a` and
/// `shape_b` swept by `motion_b` over `[t_min, t_max] ⊆ [0,1]`. Returns the
/// time of impact if the shapes touch within the interval.
pub fn time_of_impact(
    shape_a: &dyn Shape,
    motion_a: &MotionSweep,
    bound_a: Real,
    shape_b: &dyn Shape,
    motion_b: &MotionSweep,
    bound_b: Real,
    t_min: Real,
    t_max: Real,
) -> Option<Real> {
    let mut t = t_min;
    let relative_speed_bound = motion_a.max_point_speed(bound_a) + motion_b.max_point_speed(bound_b);
    if relative_speed_bound < 1.0e-9 {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let pose_a = motion_a.at(t);
        let pose_b = motion_b.at(t);

        match gjk(shape_a, &pose_a, shape_b, &pose_b) {
            GjkResult::Intersecting { .. } => return Some(t.max(t_min)),
            GjkResult::Separated { distance, .. } => {
                if distance < TARGET_DISTANCE {
                    return Some(t);
                }
                let dt = distance / relative_speed_bound;
                t += dt;
                if t > t_max {
                    return None;
                }
            }
        }
    }

    // Iteration cap: report the best estimate rather than claiming no
    // impact, so a genuinely fast pair still gets clamped this step.
    Some(t.min(t_max))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::shape::Circle;
    use crate::math::identity;

    #[test]
    fn bullet_through_thin_wall_reports_impact_time_in_range() {
        let bullet = Circle { radius: 0.05 };
        let wall = Circle { radius: 0.55 };

        let mut start = identity();
        start.translation.vector = Vector::new(-1.0, 0.0);
        let motion_bullet = MotionSweep {
            start,
            linvel: Vector::new(2.0, 0.0),
            angvel: 0.0,
            dt: 1.0,
        };
        let mut wall_pose = identity();
        wall_pose.translation.vector = Vector::new(0.0, 0.0);
        let motion_wall = MotionSweep {
            start: wall_pose,
            linvel: Vector::zeros(),
            angvel: 0.0,
            dt: 1.0,
        };

        let toi = time_of_impact(&bullet, &motion_bullet, 0.05, &wall, &motion_wall, 0.55, 0.0, 1.0);
        assert!(toi.is_some());
        let toi = toi.unwrap();
        assert!(toi > 0.0 && toi < 1.0);
    }

    #[test]
    fn non_colliding_paths_report_no_impact() {
        let a = Circle { radius: 0.1 };
        let b = Circle { radius: 0.1 };

        let mut start_a = identity();
        start_a.translation.vector = Vector::new(-5.0, 0.0);
        let motion_a = MotionSweep {
            start: start_a,
            linvel: Vector::new(1.0, 0.0),
            angvel: 0.0,
            dt: 1.0,
        };
        let mut start_b = identity();
        start_b.translation.vector = Vector::new(-5.0, 5.0);
        let motion_b = MotionSweep {
            start: start_b,
            linvel: Vector::zeros(),
            angvel: 0.0,
            dt: 1.0,
        };

        let toi = time_of_impact(&a, &motion_a, 0.1, &b, &motion_b, 0.1, 0.0, 1.0);
        assert!(toi.is_none());
    }
}
