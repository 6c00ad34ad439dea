//! Arena-backed body storage, keeping each fixture's broad-phase AABB in
//! sync with its owning body's transform and shape list.

use crate::data::arena::{Arena, Index};
use crate::dynamics::fixture::Fixture;
use crate::dynamics::rigid_body::Body;
use crate::geometry::aabb::Aabb;
use crate::geometry::broad_phase::BroadPhase;
use crate::geometry::collision_data::FixtureHandle;
use crate::math::Vector;

pub type BodyHandle = Index;

/// Owns every body in a world and the broad-phase entries for their
/// fixtures. A body's fixture list uses tombstones (`None`) on removal
/// rather than shifting indices, so a `FixtureHandle`'s `FixtureId` stays
/// valid for the fixture's whole lifetime.
#[derive(Default)]
pub struct RigidBodySet {
    bodies: Arena<Body>,
    broad_phase: BroadPhase<FixtureHandle>,
}

impl RigidBodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broad_phase(&self) -> &BroadPhase<FixtureHandle> {
        &self.broad_phase
    }

    pub fn broad_phase_mut(&mut self) -> &mut BroadPhase<FixtureHandle> {
        &mut self.broad_phase
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    pub fn get2_mut(&mut self, a: BodyHandle, b: BodyHandle) -> (Option<&mut Body>, Option<&mut Body>) {
        self.bodies.get2_mut(a, b)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut Body)> {
        self.bodies.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Adds a body, inserting a broad-phase entry for each of its fixtures.
    pub fn insert(&mut self, body: Body) -> BodyHandle {
        let handle = self.bodies.insert(body);
        let body = &self.bodies[handle];
        let transform = body.transform;
        let entries: Vec<(u32, Aabb)> = body
            .fixtures
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|f| (id as u32, Aabb::of_shape(f.shape.as_ref(), &transform))))
            .collect();
        for (id, aabb) in entries {
            self.broad_phase.add((handle, id), aabb);
        }
        handle
    }

    /// Removes a body and every broad-phase entry for its fixtures.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.remove(handle)?;
        for (id, slot) in body.fixtures.iter().enumerate() {
            if slot.is_some() {
                self.broad_phase.remove((handle, id as u32));
            }
        }
        Some(body)
    }

    /// Appends a fixture to `handle`'s fixture list and inserts its
    /// broad-phase entry. Returns the new fixture's id.
    pub fn add_fixture(&mut self, handle: BodyHandle, fixture: Fixture) -> Option<u32> {
        let body = self.bodies.get_mut(handle)?;
        let id = body.fixtures.len() as u32;
        let transform = body.transform;
        let aabb = Aabb::of_shape(fixture.shape.as_ref(), &transform);
        body.fixtures.push(Some(fixture));
        body.recompute_mass();
        self.broad_phase.add((handle, id), aabb);
        Some(id)
    }

    /// Removes a body's fixture by index, dropping its broad-phase entry and
    /// leaving the slot vacant (`None`) rather than shifting later indices,
    /// so earlier `FixtureId`s remain valid.
    pub fn remove_fixture(&mut self, handle: BodyHandle, id: u32) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        let Some(slot) = body.fixtures.get_mut(id as usize) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }
        self.broad_phase.remove((handle, id));
        body.recompute_mass();
        true
    }

    /// Refreshes the broad-phase AABB for every fixture of `handle` from its
    /// current transform and velocity, called once per step before
    /// detection.
    pub fn sync_fixture_aabbs(&mut self, handle: BodyHandle) {
        let Some(body) = self.bodies.get(handle) else {
            return;
        };
        let transform = body.transform;
        let velocity = body.linear_velocity;
        let updates: Vec<(u32, Aabb)> = body
            .fixtures
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|f| (id as u32, Aabb::of_shape(f.shape.as_ref(), &transform))))
            .collect();
        for (id, aabb) in updates {
            self.broad_phase.update((handle, id), aabb, velocity);
        }
    }

    /// Refreshes every tracked body's broad-phase AABBs; the detection
    /// sub-pipeline's `broad-phase update()` step.
    pub fn sync_all_fixture_aabbs(&mut self) {
        let handles: Vec<BodyHandle> = self.bodies.iter().map(|(h, _)| h).collect();
        for handle in handles {
            self.sync_fixture_aabbs(handle);
        }
    }

    /// Translates every body's transform and the broad-phase by `v`, for
    /// long-range coordinate renormalization.
    pub fn shift(&mut self, v: Vector) {
        for (_, body) in self.bodies.iter_mut() {
            body.transform.translation.vector += v;
            body.previous_transform.translation.vector += v;
        }
        self.broad_phase.shift(v);
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.broad_phase.clear();
    }
}
