//! The per-step orchestration layer: the listener surface a world exposes,
//! and the `PhysicsPipeline` that drives detection, island solving and CCD
//! through it.

pub mod listeners;
pub mod physics_pipeline;

pub use listeners::{BoundsListener, CollisionListener, ContactListener, Destroyed, DestructionListener, ListenerSet, StepListener, TimeOfImpactListener};
pub use physics_pipeline::{BroadPhaseFilter, DefaultBroadPhaseFilter, PhysicsPipeline};
