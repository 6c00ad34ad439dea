//! Pluggable per-contact material mixing (friction, restitution, restitution
//! velocity threshold). Swappable on a world via `World::set_value_mixer`.

use crate::math::Real;

/// Combines two fixtures' material properties into the single value a
/// contact constraint uses.
pub trait ValueMixer: Send + Sync {
    fn mix_friction(&self, friction_a: Real, friction_b: Real) -> Real;
    fn mix_restitution(&self, restitution_a: Real, restitution_b: Real) -> Real;
    fn mix_restitution_velocity_threshold(&self, threshold_a: Real, threshold_b: Real) -> Real;
}

/// Geometric mean for friction (Box2D convention), max for restitution (a
/// bouncy fixture should stay bouncy regardless of what it hits), min for
/// the restitution velocity threshold (the more sensitive fixture wins).
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultValueMixer;

impl ValueMixer for DefaultValueMixer {
    fn mix_friction(&self, friction_a: Real, friction_b: Real) -> Real {
        (friction_a * friction_b).max(0.0).sqrt()
    }

    fn mix_restitution(&self, restitution_a: Real, restitution_b: Real) -> Real {
        restitution_a.max(restitution_b)
    }

    fn mix_restitution_velocity_threshold(&self, threshold_a: Real, threshold_b: Real) -> Real {
        threshold_a.min(threshold_b)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn geometric_mean_friction() {
        let mixer = DefaultValueMixer;
        assert!((mixer.mix_friction(0.4, 0.9) - 0.6).abs() < 1.0e-3);
    }

    #[test]
    fn restitution_takes_the_max() {
        let mixer = DefaultValueMixer;
        assert_eq!(mixer.mix_restitution(0.0, 0.8), 0.8);
    }
}
