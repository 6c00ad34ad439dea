//! A rigid body: pose, motion, mass properties and the fixture list that
//! gives it both shape and mass.

use crate::dynamics::forces::{TimedForce, TimedTorque};
use crate::dynamics::fixture::Fixture;
use crate::geometry::shape::MassProperties;
use crate::math::{Isometry, Real, Vector};

/// How a body participates in mass computation and the solver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyType {
    /// Infinite mass, never moved by the solver, authored as immobile scenery.
    Static,
    /// Infinite mass, velocity is user-driven rather than force-driven; still
    /// integrated every step.
    Kinematic,
    /// Finite mass and inertia, fully simulated.
    Dynamic,
    /// Finite angular inertia, infinite (zero inverse) linear mass: moves
    /// only by rotating in place.
    FixedLinear,
    /// Finite linear mass, infinite (zero inverse) angular inertia: moves
    /// only by translating, never rotates.
    FixedAngular,
    /// Infinite mass like `Static`, but authored as such explicitly rather
    /// than defaulted; behaves identically to `Static` in the solver.
    Infinite,
}

impl BodyType {
    /// Bodies the island solver integrates position for at all. `Static`
    /// bodies are excluded even though they may be visited during DFS as cut
    /// vertices — integrating a static body's position is a correctness bug
    /// this type-level split exists to avoid.
    pub fn participates_in_islands(self) -> bool {
        !matches!(self, BodyType::Static | BodyType::Infinite)
    }
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct BodyFlags: u32 {
        const ENABLED          = 0b0000_0001;
        const ASLEEP           = 0b0000_0010;
        const AUTO_SLEEP       = 0b0000_0100;
        const BULLET           = 0b0000_1000;
        /// Scratch flag used only during one island-extraction pass.
        const ON_ISLAND        = 0b0001_0000;
    }
}

/// An independently simulated rigid entity.
pub struct Body {
    pub body_type: BodyType,
    pub transform: Isometry,
    pub previous_transform: Isometry,

    pub linear_velocity: Vector,
    pub angular_velocity: Real,
    pub linear_damping: Real,
    pub angular_damping: Real,

    pub mass: Real,
    pub inverse_mass: Real,
    pub inertia: Real,
    pub inverse_inertia: Real,
    /// Center of mass, in the body's local frame.
    pub local_center: crate::math::Point,

    pub force: Vector,
    pub torque: Real,
    pub timed_forces: Vec<TimedForce>,
    pub timed_torques: Vec<TimedTorque>,

    pub flags: BodyFlags,
    pub at_rest_time: Real,

    /// `None` marks a removed fixture's slot, kept vacant so earlier
    /// `FixtureId`s never get reassigned to a different fixture.
    pub fixtures: Vec<Option<Fixture>>,
}

impl Body {
    pub fn new(body_type: BodyType) -> Self {
        Body {
            body_type,
            transform: Isometry::identity(),
            previous_transform: Isometry::identity(),
            linear_velocity: Vector::zeros(),
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            local_center: crate::math::Point::origin(),
            force: Vector::zeros(),
            torque: 0.0,
            timed_forces: Vec::new(),
            timed_torques: Vec::new(),
            flags: BodyFlags::ENABLED | BodyFlags::AUTO_SLEEP,
            at_rest_time: 0.0,
            fixtures: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.contains(BodyFlags::ENABLED)
    }

    pub fn is_asleep(&self) -> bool {
        self.flags.contains(BodyFlags::ASLEEP)
    }

    pub fn is_bullet(&self) -> bool {
        self.flags.contains(BodyFlags::BULLET)
    }

    pub fn is_static(&self) -> bool {
        matches!(self.body_type, BodyType::Static | BodyType::Infinite)
    }

    /// Applies a one-shot force at the center of mass, accumulated until the
    /// next velocity integration clears it.
    pub fn apply_force(&mut self, force: Vector) {
        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: Real) {
        self.torque += torque;
    }

    /// Applies an instantaneous linear impulse at the center of mass.
    pub fn apply_linear_impulse(&mut self, impulse: Vector) {
        self.linear_velocity += impulse * self.inverse_mass;
    }

    /// Applies an instantaneous impulse at world-space point `point`,
    /// contributing both linear and angular velocity change.
    pub fn apply_impulse_at_point(&mut self, impulse: Vector, point: crate::math::Point) {
        self.linear_velocity += impulse * self.inverse_mass;
        let r = point - self.world_center();
        self.angular_velocity += self.inverse_inertia * crate::utils::cross(r, impulse);
    }

    pub fn world_center(&self) -> crate::math::Point {
        self.transform * self.local_center
    }

    /// Iterates over this body's live fixtures with their ids, skipping any
    /// slot vacated by a previous `remove_fixture`.
    pub fn live_fixtures(&self) -> impl Iterator<Item = (u32, &Fixture)> {
        self.fixtures.iter().enumerate().filter_map(|(id, slot)| slot.as_ref().map(|f| (id as u32, f)))
    }

    /// Puts the body to sleep: velocities and accumulators cleared, at-rest
    /// flag set. Only meaningful for bodies that participate in islands.
    pub fn sleep(&mut self) {
        self.linear_velocity = Vector::zeros();
        self.angular_velocity = 0.0;
        self.force = Vector::zeros();
        self.torque = 0.0;
        self.at_rest_time = 0.0;
        self.flags.insert(BodyFlags::ASLEEP);
    }

    pub fn wake(&mut self) {
        self.flags.remove(BodyFlags::ASLEEP);
        self.at_rest_time = 0.0;
    }

    /// Recomputes mass/inertia/center-of-mass from the current fixture list,
    /// honoring `body_type`'s fixed-mass/fixed-inertia overrides.
    pub fn recompute_mass(&mut self) {
        if matches!(self.body_type, BodyType::Static | BodyType::Kinematic | BodyType::Infinite) {
            self.mass = 0.0;
            self.inverse_mass = 0.0;
            self.inertia = 0.0;
            self.inverse_inertia = 0.0;
            self.local_center = crate::math::Point::origin();
            return;
        }

        let mut total = MassProperties::default();
        let mut center = Vector::zeros();
        let mut mass_sum = 0.0;
        for fixture in self.fixtures.iter().flatten() {
            let mp = fixture.shape.mass_properties(fixture.density);
            center += mp.center.coords * mp.mass;
            mass_sum += mp.mass;
        }
        total.mass = mass_sum;
        total.center = if mass_sum > 1.0e-9 {
            crate::math::Point::from(center / mass_sum)
        } else {
            crate::math::Point::origin()
        };

        let mut inertia = 0.0;
        for fixture in self.fixtures.iter().flatten() {
            let mp = fixture.shape.mass_properties(fixture.density);
            let d = mp.center - total.center;
            // Parallel axis theorem: shift each fixture's own inertia from
            // its own centroid to the body's combined center of mass.
            inertia += mp.inertia + mp.mass * d.coords.dot(&d.coords);
        }
        total.inertia = inertia;

        self.local_center = total.center;

        match self.body_type {
            BodyType::FixedLinear => {
                self.mass = total.mass;
                self.inverse_mass = 0.0;
                self.inertia = total.inertia;
                self.inverse_inertia = if total.inertia > 1.0e-12 { 1.0 / total.inertia } else { 0.0 };
            }
            BodyType::FixedAngular => {
                self.mass = total.mass;
                self.inverse_mass = if total.mass > 1.0e-12 { 1.0 / total.mass } else { 0.0 };
                self.inertia = total.inertia;
                self.inverse_inertia = 0.0;
            }
            _ => {
                self.mass = total.mass;
                self.inverse_mass = if total.mass > 1.0e-12 { 1.0 / total.mass } else { 0.0 };
                self.inertia = total.inertia;
                self.inverse_inertia = if total.inertia > 1.0e-12 { 1.0 / total.inertia } else { 0.0 };
            }
        }
    }
}

/// Builder for [`Body`], matching the fixture builder's fluent style.
pub struct RigidBodyBuilder {
    body: Body,
}

impl RigidBodyBuilder {
    pub fn new(body_type: BodyType) -> Self {
        RigidBodyBuilder { body: Body::new(body_type) }
    }

    pub fn translation(mut self, translation: Vector) -> Self {
        self.body.transform.translation.vector = translation;
        self.body.previous_transform = self.body.transform;
        self
    }

    pub fn rotation(mut self, angle: Real) -> Self {
        self.body.transform.rotation = crate::math::Rotation::new(angle);
        self.body.previous_transform = self.body.transform;
        self
    }

    pub fn linear_velocity(mut self, v: Vector) -> Self {
        self.body.linear_velocity = v;
        self
    }

    pub fn angular_velocity(mut self, w: Real) -> Self {
        self.body.angular_velocity = w;
        self
    }

    pub fn linear_damping(mut self, d: Real) -> Self {
        self.body.linear_damping = d;
        self
    }

    pub fn angular_damping(mut self, d: Real) -> Self {
        self.body.angular_damping = d;
        self
    }

    pub fn bullet(mut self, is_bullet: bool) -> Self {
        self.body.flags.set(BodyFlags::BULLET, is_bullet);
        self
    }

    pub fn auto_sleep(mut self, allowed: bool) -> Self {
        self.body.flags.set(BodyFlags::AUTO_SLEEP, allowed);
        self
    }

    pub fn fixture(mut self, fixture: Fixture) -> Self {
        self.body.fixtures.push(Some(fixture));
        self
    }

    pub fn build(mut self) -> Body {
        self.body.recompute_mass();
        self.body
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::fixture::FixtureBuilder;
    use crate::geometry::shape::Polygon;

    #[test]
    fn static_body_has_zero_inverse_mass_regardless_of_fixtures() {
        let body = RigidBodyBuilder::new(BodyType::Static)
            .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(1.0, 1.0))).density(5.0).build())
            .build();
        assert_eq!(body.inverse_mass, 0.0);
        assert_eq!(body.inverse_inertia, 0.0);
    }

    #[test]
    fn dynamic_box_has_positive_finite_mass() {
        let body = RigidBodyBuilder::new(BodyType::Dynamic)
            .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
            .build();
        assert!(body.mass > 0.0);
        assert!(body.inverse_mass > 0.0);
        assert!(body.inverse_inertia > 0.0);
    }

    #[test]
    fn fixed_linear_body_cannot_translate_but_can_rotate() {
        let body = RigidBodyBuilder::new(BodyType::FixedLinear)
            .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
            .build();
        assert_eq!(body.inverse_mass, 0.0);
        assert!(body.inverse_inertia > 0.0);
    }

    #[test]
    fn sleeping_clears_velocity_and_accumulators() {
        let mut body = Body::new(BodyType::Dynamic);
        body.linear_velocity = Vector::new(1.0, 2.0);
        body.angular_velocity = 3.0;
        body.force = Vector::new(5.0, 0.0);
        body.sleep();
        assert_eq!(body.linear_velocity, Vector::zeros());
        assert_eq!(body.angular_velocity, 0.0);
        assert_eq!(body.force, Vector::zeros());
        assert!(body.is_asleep());
    }
}
