//! Optional per-stage timers (see `pipeline::physics_pipeline::PhysicsPipeline::counters`).
//! Disabled by default so release builds pay nothing for them; `enable()`
//! turns on the wall-clock bookkeeping for profiling a specific run.

use std::time::{Duration, Instant};

/// A single resumable/pausable stopwatch.
#[derive(Copy, Clone, Debug, Default)]
pub struct Timer {
    enabled: bool,
    start: Option<Instant>,
    total: Duration,
}

impl Timer {
    pub fn resume(&mut self) {
        if self.enabled {
            self.start = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(start) = self.start.take() {
            self.total += start.elapsed();
        }
    }

    pub fn reset(&mut self) {
        self.start = None;
        self.total = Duration::ZERO;
    }

    pub fn time(&self) -> Duration {
        self.total
    }
}

/// Per-stage timers for one [`crate::pipeline::PhysicsPipeline::step`] call.
#[derive(Copy, Clone, Debug, Default)]
pub struct StageCounters {
    pub collision_detection_time: Timer,
    pub island_construction_time: Timer,
    pub solver_time: Timer,
    pub ccd_time: Timer,
}

/// Collision-detection sub-stage timers.
#[derive(Copy, Clone, Debug, Default)]
pub struct CollisionDetectionCounters {
    pub broad_phase_time: Timer,
    pub narrow_phase_time: Timer,
}

/// Top-level counters bag, reset at the start of every step.
#[derive(Copy, Clone, Debug, Default)]
pub struct Counters {
    enabled: bool,
    pub stages: StageCounters,
    pub cd: CollisionDetectionCounters,
}

impl Counters {
    pub fn new(enabled: bool) -> Self {
        let mut counters = Self::default();
        counters.set_enabled(enabled);
        counters
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.stages.collision_detection_time.enabled = enabled;
        self.stages.island_construction_time.enabled = enabled;
        self.stages.solver_time.enabled = enabled;
        self.stages.ccd_time.enabled = enabled;
        self.cd.broad_phase_time.enabled = enabled;
        self.cd.narrow_phase_time.enabled = enabled;
    }

    pub fn reset(&mut self) {
        let enabled = self.enabled;
        *self = Self::default();
        self.set_enabled(enabled);
    }

    pub fn step_started(&mut self) {}

    pub fn step_completed(&mut self) {}
}
