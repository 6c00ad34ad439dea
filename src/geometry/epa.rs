//! EPA: expands the GJK terminal simplex into a penetration depth + normal
//! once the origin is known to be inside the Minkowski difference.

use crate::geometry::gjk::Simplex;
use crate::geometry::shape::{minkowski_support, Shape};
use crate::math::{Isometry, Point, Real};
use crate::utils::{cross, PENETRATION_SLOP};

/// Unit normal + penetration depth of an overlapping pair.
/// `normal` points from shape A to shape B, by convention.
#[derive(Copy, Clone, Debug)]
pub struct Penetration {
    pub normal: crate::math::Vector,
    pub depth: Real,
}

const MAX_ITERATIONS: u32 = 32;
const TOLERANCE: Real = 1.0e-6;

#[derive(Copy, Clone)]
struct PolytopeEdge {
    a: Point,
    b: Point,
}

impl PolytopeEdge {
    fn normal_and_distance(&self) -> (crate::math::Vector, Real) {
        let edge = self.b - self.a;
        let mut normal = crate::utils::orthonormal(edge);
        let len = normal.norm();
        if len < 1.0e-12 {
            return (crate::math::Vector::new(0.0, 1.0), 0.0);
        }
        normal /= len;
        // Ensure outward-pointing (away from the origin, i.e. positive
        // distance from origin to the edge's supporting line).
        let distance = normal.dot(&self.a.coords);
        if distance < 0.0 {
            (-normal, -distance)
        } else {
            (normal, distance)
        }
    }
}

/// Expands `simplex` (already known to contain the origin) into a
/// penetration. Degenerate inputs (near-zero-area seed simplex) are handled
/// by padding the simplex with extra support points before iterating.
pub fn epa(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    simplex: &Simplex,
) -> Option<Penetration> {
    let mut polytope: Vec<Point> = simplex.iter().map(|v| v.point).collect();
    ensure_triangle(shape_a, pose_a, shape_b, pose_b, &mut polytope)?;
    if signed_area2(&polytope) < 0.0 {
        polytope.reverse();
    }

    for _ in 0..MAX_ITERATIONS {
        let (edge_index, normal, distance) = closest_edge(&polytope);

        let support = minkowski_support(shape_a, pose_a, shape_b, pose_b, normal);
        let support_distance = support.coords.dot(&normal);

        if support_distance - distance < TOLERANCE {
            let depth = distance;
            if depth <= PENETRATION_SLOP {
                // Numerical artifact: treat as no collision.
                return None;
            }
            return Some(Penetration { normal, depth });
        }

        // Insert the new support point between the two vertices of the
        // closest edge, pruning near-duplicate points.
        if polytope
            .iter()
            .any(|p| (*p - support).norm_squared() < 1.0e-10)
        {
            let depth = distance;
            if depth <= PENETRATION_SLOP {
                return None;
            }
            return Some(Penetration { normal, depth });
        }
        polytope.insert(edge_index + 1, support);
    }

    // Iteration cap: best current approximation.
    let (_, normal, distance) = closest_edge(&polytope);
    if distance <= PENETRATION_SLOP {
        None
    } else {
        Some(Penetration {
            normal,
            depth: distance,
        })
    }
}

fn ensure_triangle(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    polytope: &mut Vec<Point>,
) -> Option<()> {
    while polytope.len() < 3 {
        // Degenerate seed simplex (a point or a segment through the
        // origin): probe a couple of directions to flesh it into a
        // triangle. If every direction yields an existing point, the
        // shapes are genuinely degenerate; give up.
        let dirs = [
            crate::math::Vector::new(1.0, 0.0),
            crate::math::Vector::new(-1.0, 0.0),
            crate::math::Vector::new(0.0, 1.0),
            crate::math::Vector::new(0.0, -1.0),
        ];
        let mut added = false;
        for d in dirs {
            let candidate = minkowski_support(shape_a, pose_a, shape_b, pose_b, d);
            if !polytope.iter().any(|p| (*p - candidate).norm_squared() < 1.0e-10) {
                polytope.push(candidate);
                added = true;
                break;
            }
        }
        if !added {
            return None;
        }
    }
    Some(())
}

fn signed_area2(polytope: &[Point]) -> Real {
    let mut area = 0.0;
    for i in 0..polytope.len() {
        let a = polytope[i];
        let b = polytope[(i + 1) % polytope.len()];
        area += cross(a.coords, b.coords);
    }
    area
}

fn closest_edge(polytope: &[Point]) -> (usize, crate::math::Vector, Real) {
    let mut best = (0usize, crate::math::Vector::new(0.0, 1.0), Real::MAX);
    for i in 0..polytope.len() {
        let edge = PolytopeEdge {
            a: polytope[i],
            b: polytope[(i + 1) % polytope.len()],
        };
        let (normal, distance) = edge.normal_and_distance();
        if distance < best.2 {
            best = (i, normal, distance);
        }
    }
    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::gjk::{gjk, GjkResult};
    use crate::geometry::shape::{Circle, Polygon};
    use crate::math::identity;

    #[test]
    fn overlapping_circles_have_positive_depth_and_unit_normal() {
        let a = Circle { radius: 1.0 };
        let b = Circle { radius: 1.0 };
        let pose_a = identity();
        let mut pose_b = identity();
        pose_b.translation.vector = crate::math::Vector::new(0.5, 0.0);

        let simplex = match gjk(&a, &pose_a, &b, &pose_b) {
            GjkResult::Intersecting { simplex } => simplex,
            _ => panic!("expected overlap"),
        };
        let pen = epa(&a, &pose_a, &b, &pose_b, &simplex).expect("should penetrate");
        assert!(pen.depth > 0.0);
        assert!((pen.normal.norm() - 1.0).abs() < 1.0e-3);
        assert!((pen.depth - 1.5).abs() < 0.05);
    }

    #[test]
    fn coincident_boxes_never_produce_nan() {
        let a = Polygon::rectangle(1.0, 1.0);
        let b = Polygon::rectangle(1.0, 1.0);
        let pose = identity();
        let simplex = match gjk(&a, &pose, &b, &pose) {
            GjkResult::Intersecting { simplex } => simplex,
            _ => panic!("expected overlap"),
        };
        if let Some(pen) = epa(&a, &pose, &b, &pose, &simplex) {
            assert!(pen.depth.is_finite());
            assert!(pen.normal.x.is_finite() && pen.normal.y.is_finite());
            assert!(pen.depth >= 0.0);
        }
    }
}
