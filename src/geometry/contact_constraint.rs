//! The persistent contact constraint: per-pair mixed material properties
//! plus the accumulated impulses carried across steps for warm starting, and
//! the begin/persist/end matcher that threads a new manifold's points
//! through the previous step's.

use arrayvec::ArrayVec;

use crate::geometry::collision_data::FixtureHandle;
use crate::geometry::contact_id::ContactId;
use crate::geometry::manifold::Manifold;
use crate::math::Real;

/// One contact point as tracked by the solver: the manifold geometry plus
/// the accumulated impulses carried from the previous step.
#[derive(Copy, Clone, Debug)]
pub struct ContactPoint {
    pub id: ContactId,
    pub depth: Real,
    /// World-space contact location, refreshed from the manifold each step.
    pub point: crate::math::Point,
    pub normal_impulse: Real,
    pub tangent_impulse: Real,
    /// `true` for points that were matched against the previous step's list
    /// ("persist"); `false` for points that are new this step ("begin").
    pub persisted: bool,
}

/// Result of matching this step's manifold against the previous one,
/// handed to contact listeners (begin / persist / end).
#[derive(Default)]
pub struct ContactEvents {
    pub begin: Vec<ContactId>,
    pub persist: Vec<ContactId>,
    pub end: Vec<ContactId>,
}

/// Persistent per-pair contact constraint: material properties plus the
/// accumulated impulses used for warm starting.
pub struct ContactConstraint {
    pub fixture_a: FixtureHandle,
    pub fixture_b: FixtureHandle,
    pub friction: Real,
    pub restitution: Real,
    pub restitution_velocity_threshold: Real,
    pub is_sensor: bool,
    pub enabled: bool,
    pub points: ArrayVec<ContactPoint, 2>,
    pub normal: crate::math::Vector,
}

impl ContactConstraint {
    pub fn new(fixture_a: FixtureHandle, fixture_b: FixtureHandle) -> Self {
        ContactConstraint {
            fixture_a,
            fixture_b,
            friction: 0.0,
            restitution: 0.0,
            restitution_velocity_threshold: 1.0,
            is_sensor: false,
            enabled: true,
            points: ArrayVec::new(),
            normal: crate::math::Vector::new(0.0, 1.0),
        }
    }

    /// Replaces `self.points` with `manifold`'s points, carrying accumulated
    /// impulses forward for identity matches. Returns the begin/persist/end
    /// partition for listener dispatch.
    pub fn update(&mut self, manifold: &Manifold) -> ContactEvents {
        let mut events = ContactEvents::default();
        let mut new_points: ArrayVec<ContactPoint, 2> = ArrayVec::new();

        for mp in &manifold.points {
            if let Some(prev) = self.points.iter().find(|p| p.id == mp.id) {
                new_points.push(ContactPoint {
                    id: mp.id,
                    depth: mp.depth,
                    point: mp.point,
                    normal_impulse: prev.normal_impulse,
                    tangent_impulse: prev.tangent_impulse,
                    persisted: true,
                });
                events.persist.push(mp.id);
            } else {
                new_points.push(ContactPoint {
                    id: mp.id,
                    depth: mp.depth,
                    point: mp.point,
                    normal_impulse: 0.0,
                    tangent_impulse: 0.0,
                    persisted: false,
                });
                events.begin.push(mp.id);
            }
        }

        for prev in &self.points {
            if !new_points.iter().any(|p| p.id == prev.id) {
                events.end.push(prev.id);
            }
        }

        self.normal = manifold.normal;
        self.points = new_points;
        events
    }

    /// Fires an `end` event for every current point and empties the list
    /// (used when a pair's manifold goes to zero points or the pair itself
    /// is dropped).
    pub fn clear(&mut self) -> ContactEvents {
        let mut events = ContactEvents::default();
        for p in &self.points {
            events.end.push(p.id);
        }
        self.points.clear();
        events
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::Arena;
    use crate::math::Point;

    fn sample_manifold(depth: Real, reference_feature: u32) -> Manifold {
        let mut points = ArrayVec::new();
        points.push(crate::geometry::manifold::ManifoldPoint {
            id: ContactId {
                reference_feature,
                incident_feature: 0,
            },
            point: Point::origin(),
            depth,
        });
        Manifold {
            normal: crate::math::Vector::new(0.0, 1.0),
            points,
        }
    }

    #[test]
    fn matching_identity_persists_impulse_and_new_identity_begins() {
        let mut arena: Arena<()> = Arena::new();
        let h1 = arena.insert(());
        let h2 = arena.insert(());
        let mut c = ContactConstraint::new((h1, 0), (h2, 0));

        let events1 = c.update(&sample_manifold(0.1, 0));
        assert_eq!(events1.begin.len(), 1);
        assert_eq!(events1.persist.len(), 0);
        c.points[0].normal_impulse = 4.2;

        let events2 = c.update(&sample_manifold(0.05, 0));
        assert_eq!(events2.persist.len(), 1);
        assert_eq!(c.points[0].normal_impulse, 4.2);

        let events3 = c.update(&sample_manifold(0.05, 1));
        assert_eq!(events3.begin.len(), 1);
        assert_eq!(events3.end.len(), 1);
    }
}
