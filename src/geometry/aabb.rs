//! The axis-aligned bounding box type, kept to exactly what the
//! broad-phase and query layers need.

use crate::math::{Isometry, Point, Real, Vector};
use crate::geometry::shape::Shape;

/// An axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point,
    pub maxs: Point,
}

impl Aabb {
    pub fn new(mins: Point, maxs: Point) -> Self {
        Aabb { mins, maxs }
    }

    /// The tight world-space AABB of `shape` under `pose`: a body's transform
    /// and its fixtures' shape-local transforms together determine every
    /// fixture's world-space AABB.
    pub fn of_shape(shape: &dyn Shape, pose: &Isometry) -> Self {
        let (local_min, local_max) = shape.local_aabb_extents();
        let corners = [
            Point::new(local_min.x, local_min.y),
            Point::new(local_max.x, local_min.y),
            Point::new(local_min.x, local_max.y),
            Point::new(local_max.x, local_max.y),
        ];
        let mut min = pose * corners[0];
        let mut max = min;
        for c in &corners[1..] {
            let p = pose * c;
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        let r = shape.radius();
        Aabb::new(min - Vector::new(r, r), max + Vector::new(r, r))
    }

    pub fn center(&self) -> Point {
        nalgebra::center(&self.mins, &self.maxs)
    }

    pub fn half_extents(&self) -> Vector {
        (self.maxs - self.mins) * 0.5
    }

    pub fn perimeter(&self) -> Real {
        let d = self.maxs - self.mins;
        2.0 * (d.x + d.y)
    }

    /// Grows this AABB by `amount` on every side.
    pub fn expanded(&self, amount: Real) -> Self {
        let v = Vector::new(amount, amount);
        Aabb::new(self.mins - v, self.maxs + v)
    }

    /// Translates this AABB by `v` (used by broad-phase `shift`).
    pub fn translated(&self, v: Vector) -> Self {
        Aabb::new(self.mins + v, self.maxs + v)
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.mins.x <= other.mins.x
            && self.mins.y <= other.mins.y
            && self.maxs.x >= other.maxs.x
            && self.maxs.y >= other.maxs.y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.mins.x <= other.maxs.x
            && self.maxs.x >= other.mins.x
            && self.mins.y <= other.maxs.y
            && self.maxs.y >= other.mins.y
    }

    pub fn merged(&self, other: &Aabb) -> Self {
        Aabb::new(
            Point::new(self.mins.x.min(other.mins.x), self.mins.y.min(other.mins.y)),
            Point::new(self.maxs.x.max(other.maxs.x), self.maxs.y.max(other.maxs.y)),
        )
    }

    /// Combined perimeter cost of merging `self` with `other`, used by the
    /// broad-phase's surface-area-heuristic insertion.
    pub fn merged_perimeter_cost(&self, other: &Aabb) -> Real {
        self.merged(other).perimeter()
    }

    /// Ray/AABB slab test, returning the entry fraction along `[0, max_toi]`
    /// if the ray hits.
    pub fn cast_ray(&self, origin: Point, dir: Vector, max_toi: Real) -> Option<Real> {
        let mut tmin: Real = 0.0;
        let mut tmax: Real = max_toi;

        for i in 0..2 {
            let (o, d, lo, hi) = (origin[i], dir[i], self.mins[i], self.maxs[i]);
            if d.abs() < 1.0e-12 {
                if o < lo || o > hi {
                    return None;
                }
            } else {
                let inv_d = 1.0 / d;
                let mut t1 = (lo - o) * inv_d;
                let mut t2 = (hi - o) * inv_d;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                tmin = tmin.max(t1);
                tmax = tmax.min(t2);
                if tmin > tmax {
                    return None;
                }
            }
        }
        Some(tmin)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn intersects_is_symmetric_and_correct() {
        let a = Aabb::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = Aabb::new(Point::new(0.5, 0.5), Point::new(2.0, 2.0));
        let c = Aabb::new(Point::new(2.0, 2.0), Point::new(3.0, 3.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn ray_hits_box() {
        let b = Aabb::new(Point::new(-1.0, -1.0), Point::new(1.0, 1.0));
        let t = b.cast_ray(Point::new(-5.0, 0.0), Vector::new(1.0, 0.0), 100.0);
        assert_eq!(t, Some(4.0));
        let miss = b.cast_ray(Point::new(-5.0, 5.0), Vector::new(1.0, 0.0), 100.0);
        assert_eq!(miss, None);
    }
}
