//! Solver-wide tunables: the step's integration parameters and the
//! user-facing settings they are derived from.

pub mod island_solver;
pub mod position_solver;
pub mod velocity_constraint;

use crate::math::Real;

/// Continuous-collision-detection policy, applied once per step after the
/// discrete solve.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContinuousDetectionMode {
    /// Skip CCD entirely.
    None,
    /// Only consider pairs where at least one body is flagged `bullet`.
    BulletsOnly,
    /// Also consider dynamic-vs-static; dynamic-vs-dynamic still needs a
    /// bullet on one side.
    AllDynamic,
}

/// User-facing tunables, recognized by [`crate::world::World::set_settings`].
#[derive(Copy, Clone, Debug)]
pub struct Settings {
    pub step_frequency: Real,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub min_at_rest_time: Real,
    pub at_rest_linear_tolerance: Real,
    pub at_rest_angular_tolerance: Real,
    pub at_rest_detection_enabled: bool,
    pub continuous_detection_mode: ContinuousDetectionMode,
    pub linear_tolerance: Real,
    pub angular_tolerance: Real,
    pub max_linear_correction: Real,
    pub max_angular_correction: Real,
    pub baumgarte: Real,
    pub restitution_velocity_threshold: Real,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            step_frequency: 1.0 / 60.0,
            velocity_iterations: 6,
            position_iterations: 2,
            min_at_rest_time: 0.5,
            at_rest_linear_tolerance: 0.01,
            at_rest_angular_tolerance: 2.0_f32.to_radians(),
            at_rest_detection_enabled: true,
            continuous_detection_mode: ContinuousDetectionMode::BulletsOnly,
            linear_tolerance: 0.005,
            angular_tolerance: 2.0_f32.to_radians(),
            max_linear_correction: 0.2,
            max_angular_correction: 8.0_f32.to_radians(),
            baumgarte: 0.2,
            restitution_velocity_threshold: 1.0,
        }
    }
}

/// Per-step derived constants passed to every constraint's solve calls:
/// `Settings` as the solver actually consumes it for one fixed timestep.
#[derive(Copy, Clone, Debug)]
pub struct IntegrationParameters {
    pub dt: Real,
    pub baumgarte: Real,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub linear_slop: Real,
    pub angular_slop: Real,
    pub max_linear_correction: Real,
    pub max_angular_correction: Real,
    pub restitution_velocity_threshold: Real,
}

impl IntegrationParameters {
    pub fn from_settings(dt: Real, settings: &Settings) -> Self {
        IntegrationParameters {
            dt,
            baumgarte: settings.baumgarte,
            velocity_iterations: settings.velocity_iterations,
            position_iterations: settings.position_iterations,
            linear_slop: settings.linear_tolerance,
            angular_slop: settings.angular_tolerance,
            max_linear_correction: settings.max_linear_correction,
            max_angular_correction: settings.max_angular_correction,
            restitution_velocity_threshold: settings.restitution_velocity_threshold,
        }
    }

    pub fn inv_dt(&self) -> Real {
        if self.dt > 0.0 {
            1.0 / self.dt
        } else {
            0.0
        }
    }
}
