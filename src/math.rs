//! Scalar/vector type aliases shared across the crate.
//!
//! Kept as a single aliasing point so a future `f64` build only has to
//! change this file.

/// The floating point type used throughout the engine.
pub type Real = f32;

/// A 2D vector (velocity, force, displacement, ...).
pub type Vector = nalgebra::Vector2<Real>;
/// A 2D point (positions, contact points, ...).
pub type Point = nalgebra::Point2<Real>;
/// A rigid transform: translation + rotation.
pub type Isometry = nalgebra::Isometry2<Real>;
/// A pure rotation, represented as a unit complex number.
pub type Rotation = nalgebra::UnitComplex<Real>;

/// Builds the identity isometry.
pub fn identity() -> Isometry {
    Isometry::identity()
}
