//! Minimal convex-shape surface. Only what GJK/EPA, the manifold clipper and
//! mass computation actually need is implemented here: a support function, a
//! radius (for the rounding term circles contribute), the shape's local
//! vertices/normals for the clipper, and a density-based mass computation.

use crate::math::{Isometry, Point, Real, Vector};

/// The operations the narrow-phase/manifold/mass code require of a convex
/// shape. `Circle` and `Polygon` below are the two concrete shapes the rest
/// of the pipeline is exercised against; a real deployment would add capsule
/// / segment / chain shapes behind the same trait without touching GJK, EPA,
/// the clipper or the solver.
pub trait Shape: std::fmt::Debug {
    /// The extremum of this shape (in its own local frame) along `direction`.
    fn local_support(&self, direction: Vector) -> Point;

    /// The shape is the Minkowski sum of a "core" polygon/point and a disc
    /// of this radius (0 for sharp polygons, the full radius for a circle).
    fn radius(&self) -> Real;

    /// Local-frame vertices of the shape's convex core, wound
    /// counter-clockwise. A circle reports a single vertex (its center).
    fn local_vertices(&self) -> &[Point];

    /// Outward-pointing edge normals, `local_normals()[i]` is the normal of
    /// the edge from `local_vertices()[i]` to `local_vertices()[(i+1) % n]`.
    fn local_normals(&self) -> &[Vector];

    /// Mass, center of mass (local frame) and rotational inertia about that
    /// center of mass, for a uniform-density fill of this shape.
    fn mass_properties(&self, density: Real) -> MassProperties;

    /// Tight, shape-local axis-aligned extent (min/max corners), used by the
    /// broad-phase to compute a fixture's world AABB.
    fn local_aabb_extents(&self) -> (Point, Point);
}

/// Mass, center of mass and rotational inertia contributed by one fixture.
#[derive(Copy, Clone, Debug, Default)]
pub struct MassProperties {
    pub mass: Real,
    pub center: Point,
    pub inertia: Real,
}

/// A round shape of constant radius about its local origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Circle {
    pub radius: Real,
}

impl Shape for Circle {
    fn local_support(&self, _direction: Vector) -> Point {
        Point::origin()
    }

    fn radius(&self) -> Real {
        self.radius
    }

    fn local_vertices(&self) -> &[Point] {
        std::slice::from_ref(&ORIGIN_POINT)
    }

    fn local_normals(&self) -> &[Vector] {
        &[]
    }

    fn mass_properties(&self, density: Real) -> MassProperties {
        let r2 = self.radius * self.radius;
        let mass = density * std::f32::consts::PI * r2;
        let inertia = mass * r2 * 0.5;
        MassProperties {
            mass,
            center: Point::origin(),
            inertia,
        }
    }

    fn local_aabb_extents(&self) -> (Point, Point) {
        let r = Vector::new(self.radius, self.radius);
        (Point::origin() - r, Point::origin() + r)
    }
}

const ORIGIN_POINT: Point = Point::new(0.0, 0.0);

/// A convex polygon, vertices wound counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
    normals: Vec<Vector>,
}

impl Polygon {
    /// Builds a polygon from a counter-clockwise vertex loop, computing
    /// per-edge outward normals. Panics (a precondition violation, not a
    /// recoverable `PhysicsError`, since shapes are construction-time
    /// authoring data) if fewer than 3 vertices are given.
    pub fn new(vertices: Vec<Point>) -> Self {
        assert!(
            vertices.len() >= 3,
            "a polygon needs at least 3 vertices, got {}",
            vertices.len()
        );
        let normals = (0..vertices.len())
            .map(|i| {
                let a = vertices[i];
                let b = vertices[(i + 1) % vertices.len()];
                let edge = b - a;
                crate::utils::orthonormal(edge).normalize()
            })
            .collect();
        Polygon { vertices, normals }
    }

    /// An axis-aligned `w × h` rectangle centered at the local origin.
    pub fn rectangle(half_width: Real, half_height: Real) -> Self {
        Self::new(vec![
            Point::new(-half_width, -half_height),
            Point::new(half_width, -half_height),
            Point::new(half_width, half_height),
            Point::new(-half_width, half_height),
        ])
    }
}

impl Shape for Polygon {
    fn local_support(&self, direction: Vector) -> Point {
        self.vertices
            .iter()
            .copied()
            .max_by(|a, b| {
                a.coords
                    .dot(&direction)
                    .partial_cmp(&b.coords.dot(&direction))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("polygon has at least 3 vertices")
    }

    fn radius(&self) -> Real {
        0.0
    }

    fn local_vertices(&self) -> &[Point] {
        &self.vertices
    }

    fn local_normals(&self) -> &[Vector] {
        &self.normals
    }

    fn mass_properties(&self, density: Real) -> MassProperties {
        // Standard polygon mass-properties integral (sum of triangle
        // contributions from an interior reference point), the same
        // derivation used by Box2D-family engines.
        let origin = self.vertices[0];
        let mut area = 0.0;
        let mut center = Vector::zeros();
        let mut inertia = 0.0;
        const INV3: Real = 1.0 / 3.0;

        for i in 1..self.vertices.len() - 1 {
            let e1 = self.vertices[i] - origin;
            let e2 = self.vertices[i + 1] - origin;
            let d = crate::utils::cross(e1, e2);
            let triangle_area = 0.5 * d;
            area += triangle_area;
            center += triangle_area * INV3 * (e1 + e2);

            let intx2 = e1.x * e1.x + e1.x * e2.x + e2.x * e2.x;
            let inty2 = e1.y * e1.y + e1.y * e2.y + e2.y * e2.y;
            inertia += (0.25 * INV3 * d) * (intx2 + inty2);
        }

        let mass = density * area;
        let center = if area.abs() > 1.0e-9 {
            center / area
        } else {
            Vector::zeros()
        };

        // Shift inertia from the reference origin to the computed centroid,
        // then to the shape's local origin (parallel axis theorem twice).
        let mut inertia = density * inertia;
        inertia -= mass * center.dot(&center);

        MassProperties {
            mass,
            center: origin + center,
            inertia,
        }
    }

    fn local_aabb_extents(&self) -> (Point, Point) {
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for v in &self.vertices[1..] {
            min = Point::new(min.x.min(v.x), min.y.min(v.y));
            max = Point::new(max.x.max(v.x), max.y.max(v.y));
        }
        (min, max)
    }
}

/// Support function of the Minkowski difference `shape_a ⊖ shape_b` along
/// `direction`, both under their world transforms.
pub fn minkowski_support(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    direction: Vector,
) -> Point {
    minkowski_support_witness(shape_a, pose_a, shape_b, pose_b, direction).0
}

/// Like [`minkowski_support`] but also returns the witness points on each
/// shape's (rounded) surface that produced the difference point, used to
/// recover closest points for a GJK `Separated` result.
pub fn minkowski_support_witness(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    direction: Vector,
) -> (Point, Point, Point) {
    let dir_a = pose_a.rotation.inverse_transform_vector(&direction);
    let dir_b = pose_b.rotation.inverse_transform_vector(&(-direction));
    let unit_dir = direction.normalize();
    let witness_a = pose_a * shape_a.local_support(dir_a) + unit_dir * shape_a.radius();
    let witness_b = pose_b * shape_b.local_support(dir_b) - unit_dir * shape_b.radius();
    let diff = witness_a - witness_b;
    (Point::from(diff), witness_a, witness_b)
}
