//! GJK: decides overlap / computes separation between two convex shapes
//!. EPA (in `epa.rs`) takes over once GJK reports the origin is
//! contained in the simplex, to extract a penetration depth and normal.

use arrayvec::ArrayVec;

use crate::geometry::shape::{minkowski_support_witness, Shape};
use crate::math::{Isometry, Point, Real, Vector};
use crate::utils::GJK_EPS;

/// One vertex of the GJK simplex: the Minkowski-difference support point,
/// plus the witness points on each shape that produced it (needed to
/// recover closest points for a `Separated` result).
#[derive(Copy, Clone, Debug)]
pub struct SimplexVertex {
    pub point: Point,
    pub witness_a: Point,
    pub witness_b: Point,
}

/// Up to a triangle (2D never needs a tetrahedron).
pub type Simplex = ArrayVec<SimplexVertex, 3>;

/// The two possible exact outcomes of a GJK run.
#[derive(Debug)]
pub enum GjkResult {
    /// The shapes do not overlap.
    Separated {
        distance: Real,
        /// Unit vector from the closest point on A to the closest point on B.
        normal: Vector,
        closest_a: Point,
        closest_b: Point,
    },
    /// The origin lies in (or on) the simplex: shapes overlap. The final
    /// simplex is handed to EPA to extract a penetration.
    Intersecting { simplex: Simplex },
}

const MAX_ITERATIONS: u32 = 32;

fn support(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    direction: Vector,
) -> SimplexVertex {
    let (point, witness_a, witness_b) =
        minkowski_support_witness(shape_a, pose_a, shape_b, pose_b, direction);
    SimplexVertex {
        point,
        witness_a,
        witness_b,
    }
}

/// Runs GJK between `shape_a` at `pose_a` and `shape_b` at `pose_b`.
pub fn gjk(shape_a: &dyn Shape, pose_a: &Isometry, shape_b: &dyn Shape, pose_b: &Isometry) -> GjkResult {
    let mut direction = {
        let d = pose_b.translation.vector - pose_a.translation.vector;
        if d.norm_squared() > GJK_EPS {
            d
        } else {
            Vector::new(1.0, 0.0)
        }
    };

    let first = support(shape_a, pose_a, shape_b, pose_b, direction);
    let mut simplex: Simplex = ArrayVec::new();
    direction = -first.point.coords;
    simplex.push(first);
    if direction.norm_squared() < GJK_EPS {
        // The very first support point landed on the origin: degenerate
        // touching case, treat as a (zero-depth) overlap for EPA to refine.
        return GjkResult::Intersecting { simplex };
    }

    for _ in 0..MAX_ITERATIONS {
        let candidate = support(shape_a, pose_a, shape_b, pose_b, direction);

        // The candidate didn't pass the origin along the search direction:
        // the Minkowski difference cannot contain the origin (
        // termination: "no closer vertex producible within tolerance").
        if candidate.point.coords.dot(&direction) < 0.0 {
            return separated_result(&simplex, direction);
        }

        if simplex
            .iter()
            .any(|v| (v.point - candidate.point).norm_squared() < GJK_EPS)
        {
            return separated_result(&simplex, direction);
        }

        simplex.push(candidate);

        match reduce_simplex(&mut simplex, &mut direction) {
            SimplexUpdate::ContainsOrigin => return GjkResult::Intersecting { simplex },
            SimplexUpdate::Continue => {}
        }

        if direction.norm_squared() < GJK_EPS {
            return GjkResult::Intersecting { simplex };
        }
    }

    // Iteration cap hit: return the best current approximation.
    GjkResult::Intersecting { simplex }
}

enum SimplexUpdate {
    ContainsOrigin,
    Continue,
}

/// Reduces `simplex` to the sub-feature (vertex/edge/triangle) closest to
/// the origin and computes the next search direction, following the
/// standard 2D GJK case analysis.
fn reduce_simplex(simplex: &mut Simplex, direction: &mut Vector) -> SimplexUpdate {
    match simplex.len() {
        1 => {
            let a = simplex[0];
            *direction = -a.point.coords;
            SimplexUpdate::Continue
        }
        2 => {
            let a = simplex[1];
            let b = simplex[0];
            let ab = b.point - a.point;
            let ao = -a.point.coords;
            if ab.dot(&ao) > 0.0 {
                *direction = crate::utils::orthonormal(ab);
                if direction.dot(&ao) < 0.0 {
                    *direction = -*direction;
                }
            } else {
                simplex.clear();
                simplex.push(a);
                *direction = ao;
            }
            SimplexUpdate::Continue
        }
        3 => {
            // `a` is the most recently added vertex; only the two edges
            // touching it can possibly be closer to the origin than the
            // triangle's interior (the opposite edge was already ruled out
            // when `a` was chosen as an improving support point).
            let a = simplex[2];
            let b = simplex[1];
            let c = simplex[0];
            let ab = b.point - a.point;
            let ac = c.point - a.point;
            let ao = -a.point.coords;

            let ab_perp = triple_product(ac, ab, ab);
            let ac_perp = triple_product(ab, ac, ac);

            if ab_perp.dot(&ao) > 0.0 {
                // Origin is outside edge AB: drop C.
                simplex.clear();
                simplex.push(b);
                simplex.push(a);
                *direction = ab_perp;
                SimplexUpdate::Continue
            } else if ac_perp.dot(&ao) > 0.0 {
                // Origin is outside edge AC: drop B.
                simplex.clear();
                simplex.push(c);
                simplex.push(a);
                *direction = ac_perp;
                SimplexUpdate::Continue
            } else {
                // Origin is inside the triangle.
                SimplexUpdate::ContainsOrigin
            }
        }
        _ => unreachable!("simplex never exceeds 3 points in 2D"),
    }
}

/// `(a × b) × c` specialized to 2D vectors (returns a vector, not a scalar),
/// used to get the outward-pointing perpendicular of an edge relative to a
/// third point.
fn triple_product(a: Vector, b: Vector, c: Vector) -> Vector {
    let z = crate::utils::cross(a, b);
    Vector::new(-z * c.y, z * c.x)
}

fn separated_result(simplex: &Simplex, direction: Vector) -> GjkResult {
    let (distance, closest_a, closest_b) = closest_point_to_origin(simplex);
    let normal = if distance > GJK_EPS {
        (closest_b - closest_a) / distance
    } else {
        -direction.normalize()
    };
    GjkResult::Separated {
        distance,
        normal,
        closest_a,
        closest_b,
    }
}

fn closest_point_to_origin(simplex: &Simplex) -> (Real, Point, Point) {
    match simplex.len() {
        1 => {
            let v = simplex[0];
            (v.point.coords.norm(), v.witness_a, v.witness_b)
        }
        2 => {
            let a = simplex[0];
            let b = simplex[1];
            let ab = b.point - a.point;
            let t = (-a.point.coords.dot(&ab) / ab.norm_squared().max(GJK_EPS)).clamp(0.0, 1.0);
            let closest_a = a.witness_a + (b.witness_a - a.witness_a) * t;
            let closest_b = a.witness_b + (b.witness_b - a.witness_b) * t;
            let dist = (a.point + ab * t).coords.norm();
            (dist, closest_a, closest_b)
        }
        _ => simplex
            .iter()
            .map(|v| (v.point.coords.norm(), v.witness_a, v.witness_b))
            .fold((Real::MAX, Point::origin(), Point::origin()), |best, cur| {
                if cur.0 < best.0 {
                    cur
                } else {
                    best
                }
            }),
    }
}
