//! Stable per-point contact identity, used to match this step's manifold
//! points against the previous step's for warm starting (see
//! `ContactConstraint::update`).

/// Identifies a manifold point by the pair of supporting features (vertex
/// indices on each shape's convex core) that produced it. A circle
/// contributes the synthetic feature index `0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContactId {
    pub reference_feature: u32,
    pub incident_feature: u32,
}
