//! A fixture: one convex shape attached to a body, with the material and
//! filtering properties the narrow-phase and solver need.

use bitflags::bitflags;

use crate::geometry::shape::Shape;
use crate::math::Real;

bitflags! {
    /// Broad-phase collision filter bits. Two fixtures may collide only if
    /// `(a.category & b.mask) != 0 && (b.category & a.mask) != 0`, unless
    /// they share a non-zero `group` with the same sign (positive groups
    /// always collide, negative groups never do, overriding the masks).
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct CategoryBits: u32 {
        const CATEGORY_1 = 0b0000_0001;
        const ALL = u32::MAX;
    }
}

/// A fixture's collision filter.
#[derive(Copy, Clone, Debug)]
pub struct Filter {
    pub category: CategoryBits,
    pub mask: CategoryBits,
    pub group: i16,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            category: CategoryBits::CATEGORY_1,
            mask: CategoryBits::ALL,
            group: 0,
        }
    }
}

impl Filter {
    /// Whether two fixtures carrying these filters are allowed to collide.
    pub fn can_collide(&self, other: &Filter) -> bool {
        if self.group != 0 && self.group == other.group {
            return self.group > 0;
        }
        (self.category.bits() & other.mask.bits()) != 0 && (other.category.bits() & self.mask.bits()) != 0
    }
}

/// A convex shape attached to a body.
pub struct Fixture {
    pub shape: Box<dyn Shape>,
    pub density: Real,
    pub friction: Real,
    pub restitution: Real,
    pub restitution_velocity_threshold: Real,
    pub filter: Filter,
    pub is_sensor: bool,
}

impl Fixture {
    pub fn new(shape: Box<dyn Shape>) -> Self {
        Fixture {
            shape,
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            restitution_velocity_threshold: 1.0,
            filter: Filter::default(),
            is_sensor: false,
        }
    }
}

/// Builder for [`Fixture`], mirroring the body builder's fluent style.
pub struct FixtureBuilder {
    fixture: Fixture,
}

impl FixtureBuilder {
    pub fn new(shape: Box<dyn Shape>) -> Self {
        FixtureBuilder {
            fixture: Fixture::new(shape),
        }
    }

    pub fn density(mut self, density: Real) -> Self {
        self.fixture.density = density;
        self
    }

    pub fn friction(mut self, friction: Real) -> Self {
        self.fixture.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: Real) -> Self {
        self.fixture.restitution = restitution;
        self
    }

    pub fn restitution_velocity_threshold(mut self, threshold: Real) -> Self {
        self.fixture.restitution_velocity_threshold = threshold;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.fixture.filter = filter;
        self
    }

    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.fixture.is_sensor = is_sensor;
        self
    }

    pub fn build(self) -> Fixture {
        self.fixture
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matching_categories_and_masks_collide_by_default() {
        let a = Filter::default();
        let b = Filter::default();
        assert!(a.can_collide(&b));
    }

    #[test]
    fn negative_shared_group_never_collides_regardless_of_masks() {
        let mut a = Filter::default();
        let mut b = Filter::default();
        a.group = -5;
        b.group = -5;
        assert!(!a.can_collide(&b));
    }

    #[test]
    fn positive_shared_group_always_collides() {
        let mut a = Filter::default();
        let mut b = Filter::default();
        a.mask = CategoryBits::empty();
        b.mask = CategoryBits::empty();
        a.group = 3;
        b.group = 3;
        assert!(a.can_collide(&b));
    }
}
