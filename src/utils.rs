//! Small geometric helpers used by the narrow-phase, manifold and solver
//! code. Kept free-standing (rather than inherent methods on `math`
//! aliases) so they read the same way across every call site, specialized to
//! 2D where the cross product of two vectors is a scalar.

use crate::math::{Real, Vector};

/// 2D analogue of the 3D cross product: `a.x * b.y - a.y * b.x`.
#[inline(always)]
pub fn cross(a: Vector, b: Vector) -> Real {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar (angular velocity) and a vector, i.e. `ω × r`.
#[inline(always)]
pub fn cross_scalar_vector(w: Real, r: Vector) -> Vector {
    Vector::new(-w * r.y, w * r.x)
}

/// Returns a unit vector orthogonal to `v` (rotate 90° counter-clockwise).
#[inline(always)]
pub fn orthonormal(v: Vector) -> Vector {
    Vector::new(-v.y, v.x)
}

/// Clamps `value` into `[lo, hi]`.
#[inline(always)]
pub fn clamp(value: Real, lo: Real, hi: Real) -> Real {
    value.max(lo).min(hi)
}

/// Numerical tolerance used by GJK/EPA convergence checks.
pub const GJK_EPS: Real = 1.0e-8;

/// Treat anything at or below this depth as "not a collision": zero-depth
/// EPA results are numerical artifacts, not real overlap.
pub const PENETRATION_SLOP: Real = 1.0e-6;
