//! Orchestrates GJK and EPA into the public overlap test the pipeline
//! consumes, plus a post-processor hook point (e.g. for suppressing
//! "ghost" internal-normal collisions between adjacent chain segments — no
//! such shapes ship in this crate, so the default hook is a no-op).

use log::warn;

use crate::geometry::epa::{epa, Penetration};
use crate::geometry::gjk::{gjk, GjkResult};
use crate::geometry::shape::Shape;
use crate::math::{Isometry, Point, Real};

/// The non-overlapping outcome: distance between the shapes and the closest
/// point on each.
#[derive(Copy, Clone, Debug)]
pub struct Separation {
    pub distance: Real,
    pub normal: crate::math::Vector,
    pub closest_a: Point,
    pub closest_b: Point,
}

/// Either outcome of testing one pair.
pub enum NarrowPhaseResult {
    Penetrating(Penetration),
    Separated(Separation),
}

/// Hook run after EPA succeeds, letting a caller veto or zero a penetration
/// for reasons the pure geometry can't know about. Default is an identity
/// pass-through.
pub trait NarrowPhasePostProcessor: Send + Sync {
    fn process(&self, penetration: Penetration) -> Option<Penetration> {
        Some(penetration)
    }
}

#[derive(Default)]
pub struct IdentityPostProcessor;
impl NarrowPhasePostProcessor for IdentityPostProcessor {}

/// Runs GJK, and EPA if GJK reports overlap, between two convex shapes.
/// Numerical degeneracy (EPA failing to converge into a usable polytope) is
/// absorbed here: it is logged and reported as "not colliding", never
/// surfaced as a `PhysicsError`.
pub fn test_pair(
    shape_a: &dyn Shape,
    pose_a: &Isometry,
    shape_b: &dyn Shape,
    pose_b: &Isometry,
    post_processor: &dyn NarrowPhasePostProcessor,
) -> NarrowPhaseResult {
    match gjk(shape_a, pose_a, shape_b, pose_b) {
        GjkResult::Separated {
            distance,
            normal,
            closest_a,
            closest_b,
        } => NarrowPhaseResult::Separated(Separation {
            distance,
            normal,
            closest_a,
            closest_b,
        }),
        GjkResult::Intersecting { simplex } => match epa(shape_a, pose_a, shape_b, pose_b, &simplex) {
            Some(pen) => match post_processor.process(pen) {
                Some(pen) => NarrowPhaseResult::Penetrating(pen),
                None => NarrowPhaseResult::Separated(Separation {
                    distance: 0.0,
                    normal: pen.normal,
                    closest_a: pose_a.translation.vector.into(),
                    closest_b: pose_b.translation.vector.into(),
                }),
            },
            None => {
                warn!("narrow-phase: EPA could not extract a usable penetration, treating pair as non-colliding");
                NarrowPhaseResult::Separated(Separation {
                    distance: 0.0,
                    normal: crate::math::Vector::new(0.0, 1.0),
                    closest_a: pose_a.translation.vector.into(),
                    closest_b: pose_b.translation.vector.into(),
                })
            }
        },
    }
}
