//! Turns a penetration {normal, depth} into a 1-2 point contact manifold by
//! clipping the incident edge against the reference edge's side planes
//! (Sutherland-Hodgman), the standard polygon-vs-polygon construction. Round
//! shapes (a single local vertex, per `Shape::local_vertices`) are handled
//! as a single-point special case rather than forced through the clipper.

use arrayvec::ArrayVec;

use crate::geometry::contact_id::ContactId;
use crate::geometry::epa::Penetration;
use crate::geometry::shape::Shape;
use crate::math::{Isometry, Point, Real, Vector};

/// One point of contact: a stable identity, the world-space contact point
/// and its penetration depth.
#[derive(Copy, Clone, Debug)]
pub struct ManifoldPoint {
    pub id: ContactId,
    pub point: Point,
    pub depth: Real,
}

/// The 1-2 point contact set for one colliding fixture pair this step.
/// `normal` points from shape A to shape B.
#[derive(Clone, Debug)]
pub struct Manifold {
    pub normal: Vector,
    pub points: ArrayVec<ManifoldPoint, 2>,
}

fn is_round(shape: &dyn Shape) -> bool {
    shape.local_vertices().len() == 1
}

fn world_vertices(shape: &dyn Shape, pose: &Isometry) -> Vec<Point> {
    shape.local_vertices().iter().map(|v| pose * v).collect()
}

fn world_normals(shape: &dyn Shape, pose: &Isometry) -> Vec<Vector> {
    shape
        .local_normals()
        .iter()
        .map(|n| pose.rotation * n)
        .collect()
}

/// Index (and alignment score) of the edge of `shape` whose outward normal
/// is most aligned with `direction`.
fn best_edge(normals: &[Vector], direction: Vector) -> (usize, Real) {
    let mut best_index = 0;
    let mut best_dot = Real::MIN;
    for (i, n) in normals.iter().enumerate() {
        let d = n.dot(&direction);
        if d > best_dot {
            best_dot = d;
            best_index = i;
        }
    }
    (best_index, best_dot)
}

/// Builds the contact manifold for an overlapping pair, given the
/// penetration `EPA` already extracted.
pub fn build_manifold(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    pen: &Penetration,
) -> Manifold {
    match (is_round(shape_a), is_round(shape_b)) {
        (true, true) => circle_circle_manifold(shape_a, pose_a, shape_b, pose_b, pen),
        (true, false) => {
            let flipped = polygon_circle_manifold(shape_b, pose_b, shape_a, pose_a, -pen.normal, pen.depth);
            Manifold {
                normal: pen.normal,
                points: flipped.points,
            }
        }
        (false, true) => polygon_circle_manifold(shape_a, pose_a, shape_b, pose_b, pen.normal, pen.depth),
        (false, false) => polygon_polygon_manifold(shape_a, pose_a, shape_b, pose_b, pen),
    }
}

fn circle_circle_manifold(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    pen: &Penetration,
) -> Manifold {
    let center_a = pose_a * shape_a.local_vertices()[0];
    let center_b = pose_b * shape_b.local_vertices()[0];
    let surface_a = center_a + pen.normal * shape_a.radius();
    let surface_b = center_b - pen.normal * shape_b.radius();
    let point = nalgebra::center(&surface_a, &surface_b);

    let mut points = ArrayVec::new();
    points.push(ManifoldPoint {
        id: ContactId {
            reference_feature: 0,
            incident_feature: 0,
        },
        point,
        depth: pen.depth,
    });
    Manifold {
        normal: pen.normal,
        points,
    }
}

/// Manifold between `polygon` (shape A's role) and a round point-shape
/// `circle` (shape B's role), `normal` pointing from polygon to circle.
fn polygon_circle_manifold(
    polygon: &dyn Shape,
    polygon_pose: &Isometry,
    circle: &dyn Shape,
    circle_pose: &Isometry,
    normal: Vector,
    depth: Real,
) -> Manifold {
    let normals = world_normals(polygon, polygon_pose);
    let (edge_index, _) = best_edge(&normals, normal);
    let vertices = world_vertices(polygon, polygon_pose);
    let v1 = vertices[edge_index];
    let v2 = vertices[(edge_index + 1) % vertices.len()];

    let center = circle_pose * circle.local_vertices()[0];
    // Clamp the circle center onto the reference edge's segment, then offset
    // onto the polygon surface, the standard face/circle contact point.
    let edge = v2 - v1;
    let t = ((center - v1).dot(&edge) / edge.norm_squared().max(1.0e-12)).clamp(0.0, 1.0);
    let closest_on_edge = v1 + edge * t;
    let point = closest_on_edge + normal * (0.5 * circle.radius() - 0.5 * depth.max(0.0));

    let mut points = ArrayVec::new();
    points.push(ManifoldPoint {
        id: ContactId {
            reference_feature: edge_index as u32,
            incident_feature: 0,
        },
        point,
        depth,
    });
    Manifold { normal, points }
}

fn polygon_polygon_manifold(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    pen: &Penetration,
) -> Manifold {
    let normals_a = world_normals(shape_a, pose_a);
    let normals_b = world_normals(shape_b, pose_b);
    let (edge_a, dot_a) = best_edge(&normals_a, pen.normal);
    let (edge_b, dot_b) = best_edge(&normals_b, -pen.normal);

    let (reference_is_a, ref_edge, ref_normal) = if dot_a >= dot_b {
        (true, edge_a, normals_a[edge_a])
    } else {
        (false, edge_b, normals_b[edge_b])
    };

    let (ref_vertices, ref_normals, inc_vertices, inc_normals) = if reference_is_a {
        (
            world_vertices(shape_a, pose_a),
            &normals_a,
            world_vertices(shape_b, pose_b),
            &normals_b,
        )
    } else {
        (
            world_vertices(shape_b, pose_b),
            &normals_b,
            world_vertices(shape_a, pose_a),
            &normals_a,
        )
    };

    let ref_v1 = ref_vertices[ref_edge];
    let ref_v2 = ref_vertices[(ref_edge + 1) % ref_vertices.len()];
    let tangent = (ref_v2 - ref_v1).normalize();

    // Incident edge: the one on the other polygon whose normal is most
    // anti-parallel to the reference normal.
    let (incident_edge, _) = best_edge(inc_normals, -ref_normal);
    let inc_v1 = inc_vertices[incident_edge];
    let inc_v2 = inc_vertices[(incident_edge + 1) % inc_vertices.len()];

    let mut points: ArrayVec<(Point, u32), 2> = ArrayVec::new();
    points.push((inc_v1, incident_edge as u32));
    points.push((
        inc_v2,
        ((incident_edge + 1) % inc_vertices.len()) as u32,
    ));

    // Clip against the side plane at ref_v1 (facing back along -tangent).
    let clipped1 = clip_segment(&points, -tangent, -tangent.dot(&ref_v1.coords));
    if clipped1.len() < 2 {
        return Manifold {
            normal: pen.normal,
            points: ArrayVec::new(),
        };
    }
    // Clip against the side plane at ref_v2 (facing forward along tangent).
    let clipped2 = clip_segment(&clipped1, tangent, tangent.dot(&ref_v2.coords));

    let mut out = ArrayVec::new();
    for (point, incident_feature) in clipped2 {
        let separation = ref_normal.dot(&(point - ref_v1));
        if separation <= 0.0 {
            let depth = -separation;
            let projected = point - ref_normal * separation;
            let id = if reference_is_a {
                ContactId {
                    reference_feature: ref_edge as u32,
                    incident_feature,
                }
            } else {
                ContactId {
                    reference_feature: incident_feature,
                    incident_feature: ref_edge as u32,
                }
            };
            if out
                .try_push(ManifoldPoint {
                    id,
                    point: projected,
                    depth,
                })
                .is_err()
            {
                break;
            }
        }
    }

    Manifold {
        normal: pen.normal,
        points: out,
    }
}

/// Clips the 2-point segment `points` against the half-plane
/// `{p : normal.dot(p) <= offset}`, returning 0, 1 or 2 points.
fn clip_segment(
    points: &ArrayVec<(Point, u32), 2>,
    normal: Vector,
    offset: Real,
) -> ArrayVec<(Point, u32), 2> {
    let mut out = ArrayVec::new();
    if points.len() < 2 {
        return out;
    }
    let dist0 = normal.dot(&points[0].0.coords) - offset;
    let dist1 = normal.dot(&points[1].0.coords) - offset;

    if dist0 <= 0.0 {
        out.push(points[0]);
    }
    if dist1 <= 0.0 {
        out.push(points[1]);
    }

    if dist0 * dist1 < 0.0 {
        let t = dist0 / (dist0 - dist1);
        let point = points[0].0 + (points[1].0 - points[0].0) * t;
        let feature = if dist0 > 0.0 { points[0].1 } else { points[1].1 };
        let _ = out.try_push((point, feature));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::epa::{epa, Penetration};
    use crate::geometry::gjk::{gjk, GjkResult};
    use crate::geometry::shape::{Circle, Polygon};
    use crate::math::identity;

    fn overlap(shape_a: &dyn Shape, pose_a: &Isometry, shape_b: &dyn Shape, pose_b: &Isometry) -> Penetration {
        let simplex = match gjk(shape_a, pose_a, shape_b, pose_b) {
            GjkResult::Intersecting { simplex } => simplex,
            GjkResult::Separated { .. } => panic!("expected overlap"),
        };
        epa(shape_a, pose_a, shape_b, pose_b, &simplex).expect("expected positive depth")
    }

    #[test]
    fn overlapping_boxes_produce_two_point_manifold() {
        let a = Polygon::rectangle(1.0, 1.0);
        let b = Polygon::rectangle(1.0, 1.0);
        let pose_a = identity();
        let mut pose_b = identity();
        pose_b.translation.vector = Vector::new(1.5, 0.0);

        let pen = overlap(&a, &pose_a, &b, &pose_b);
        let manifold = build_manifold(&a, &pose_a, &b, &pose_b, &pen);
        assert!(!manifold.points.is_empty());
        for p in &manifold.points {
            assert!(p.depth > 0.0);
        }
    }

    #[test]
    fn overlapping_circles_produce_single_point_manifold() {
        let a = Circle { radius: 1.0 };
        let b = Circle { radius: 1.0 };
        let pose_a = identity();
        let mut pose_b = identity();
        pose_b.translation.vector = Vector::new(1.0, 0.0);

        let pen = overlap(&a, &pose_a, &b, &pose_b);
        let manifold = build_manifold(&a, &pose_a, &b, &pose_b, &pen);
        assert_eq!(manifold.points.len(), 1);
    }
}
