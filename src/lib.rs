//! A 2D rigid-body dynamics engine core: dynamic-AABB-tree broad-phase,
//! GJK/EPA narrow-phase, Sutherland-Hodgman manifold clipping, an islanded
//! sequential-impulse velocity solver with warm-starting and NGS position
//! correction, and conservative-advancement continuous collision detection.
//!
//! [`World`] is the entry point: it owns every body, fixture and joint, and
//! advances them with [`World::update`]/[`World::step`]. Everything below
//! `world` is organized bottom-up:
//!
//! - [`geometry`] — shapes, broad-phase, narrow-phase, manifolds, contact
//!   constraints, raycasting and time-of-impact. No mass or solver knowledge.
//! - [`dynamics`] — bodies, fixtures, joints, the constraint graph and the
//!   island solver built on top of the geometry layer.
//! - [`pipeline`] — the listener surface and the per-step orchestration that
//!   wires detection, island solving and CCD into one fixed sequence.

pub mod counters;
pub mod data;
pub mod dynamics;
pub mod errors;
pub mod geometry;
pub mod math;
pub mod pipeline;
pub mod utils;
pub mod world;

pub use dynamics::{
    Body, BodyFlags, BodyHandle, BodyType, CategoryBits, CcdSolver, ConstraintGraph, ContinuousDetectionMode, DistanceJoint, Filter, Fixture,
    FixtureBuilder, FrictionJoint, Island, IntegrationParameters, Joint, JointBase, JointDef, JointHandle, JointSet, MouseJoint, RevoluteJoint,
    RigidBodyBuilder, RigidBodySet, Settings, WeldJoint,
};
pub use errors::{PhysicsError, Result};
pub use geometry::{Aabb, Circle, FixtureId, MassProperties, NarrowPhasePostProcessor, Polygon, RayHit, Shape, ValueMixer};
pub use pipeline::{
    BoundsListener, BroadPhaseFilter, CollisionListener, ContactListener, Destroyed, DestructionListener, StepListener, TimeOfImpactListener,
};
pub use world::{World, EARTH_GRAVITY};
