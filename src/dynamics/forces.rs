//! Timed force/torque records: small accumulator entries applied every step
//! until their own completion rule says to drop them.

use crate::math::{Real, Vector};

/// When a pending timed force/torque is done being applied.
pub enum Expiry {
    /// Apply for exactly this many seconds of simulated time, counting down
    /// by `dt` each step.
    RemainingTime(Real),
    /// Apply until the supplied predicate returns `true`. Evaluated after
    /// this step's `dt` has already been applied, matching `RemainingTime`'s
    /// "expires at the end of the step that exhausts it" timing.
    Predicate(Box<dyn FnMut(Real) -> bool>),
}

impl Expiry {
    /// Advances the expiry by `dt` and reports whether it is now complete.
    fn tick(&mut self, dt: Real) -> bool {
        match self {
            Expiry::RemainingTime(remaining) => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            Expiry::Predicate(pred) => pred(dt),
        }
    }
}

/// A pending linear force, applied at the body's center of mass.
pub struct TimedForce {
    pub force: Vector,
    pub expiry: Expiry,
}

/// A pending torque.
pub struct TimedTorque {
    pub torque: Real,
    pub expiry: Expiry,
}

impl TimedForce {
    pub fn for_duration(force: Vector, duration: Real) -> Self {
        TimedForce {
            force,
            expiry: Expiry::RemainingTime(duration),
        }
    }

    pub fn until(force: Vector, predicate: impl FnMut(Real) -> bool + 'static) -> Self {
        TimedForce {
            force,
            expiry: Expiry::Predicate(Box::new(predicate)),
        }
    }

    /// Advances this entry's expiry by `dt`; `true` once it should be
    /// dropped after this step.
    pub fn is_complete(&mut self, dt: Real) -> bool {
        self.expiry.tick(dt)
    }
}

impl TimedTorque {
    pub fn for_duration(torque: Real, duration: Real) -> Self {
        TimedTorque {
            torque,
            expiry: Expiry::RemainingTime(duration),
        }
    }

    pub fn until(torque: Real, predicate: impl FnMut(Real) -> bool + 'static) -> Self {
        TimedTorque {
            torque,
            expiry: Expiry::Predicate(Box::new(predicate)),
        }
    }

    pub fn is_complete(&mut self, dt: Real) -> bool {
        self.expiry.tick(dt)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duration_expires_once_remaining_time_is_exhausted() {
        let mut f = TimedForce::for_duration(Vector::new(1.0, 0.0), 0.05);
        assert!(!f.is_complete(0.03));
        assert!(f.is_complete(0.03));
    }

    #[test]
    fn predicate_expiry_defers_to_the_closure() {
        let mut calls = 0;
        let mut f = TimedForce::until(Vector::new(0.0, 1.0), move |_dt| {
            calls += 1;
            calls >= 2
        });
        assert!(!f.is_complete(0.016));
        assert!(f.is_complete(0.016));
    }
}
