//! Bodies, fixtures, joints and the solver that advances them: everything
//! above the pure geometry layer and below the per-step pipeline
//! orchestration.

pub mod ccd;
pub mod fixture;
pub mod forces;
pub mod graph;
pub mod joint;
pub mod rigid_body;
pub mod rigid_body_set;
pub mod solver;

pub use ccd::CcdSolver;
pub use fixture::{CategoryBits, Filter, Fixture, FixtureBuilder};
pub use forces::{Expiry, TimedForce, TimedTorque};
pub use graph::{extract_islands, ConstraintGraph, Island};
pub use joint::{
    DistanceJoint, FrictionJoint, Joint, JointBase, JointDef, JointHandle, JointSet, MouseJoint, RevoluteJoint, WeldJoint,
};
pub use rigid_body::{Body, BodyFlags, BodyType, RigidBodyBuilder};
pub use rigid_body_set::{BodyHandle, RigidBodySet};
pub use solver::island_solver::solve_island;
pub use solver::{ContinuousDetectionMode, IntegrationParameters, Settings};
