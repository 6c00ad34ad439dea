//! Collision geometry: shapes, broad-phase, narrow-phase, manifold
//! generation, persistent contact constraints and continuous-collision
//! time-of-impact. Everything here is pure geometry/state with no knowledge
//! of mass, forces or the solver.

pub mod aabb;
pub mod broad_phase;
pub mod collision_data;
pub mod contact_constraint;
pub mod contact_id;
pub mod epa;
pub mod gjk;
pub mod manifold;
pub mod narrow_phase;
pub mod query;
pub mod shape;
pub mod toi;
pub mod value_mixer;

pub use aabb::Aabb;
pub use broad_phase::BroadPhase;
pub use collision_data::{BodyHandle, CollisionData, CollisionDataMap, FixtureHandle, FixtureId, PairFlags, PairKey};
pub use contact_constraint::{ContactConstraint, ContactEvents, ContactPoint};
pub use contact_id::ContactId;
pub use epa::{epa, Penetration};
pub use gjk::{gjk, GjkResult};
pub use manifold::{build_manifold, Manifold, ManifoldPoint};
pub use narrow_phase::{test_pair, IdentityPostProcessor, NarrowPhasePostProcessor, NarrowPhaseResult, Separation};
pub use query::{raycast_candidates, raycast_closest, raycast_shape, RayHit};
pub use shape::{Circle, MassProperties, Polygon, Shape};
pub use toi::{time_of_impact, MotionSweep};
pub use value_mixer::{DefaultValueMixer, ValueMixer};
