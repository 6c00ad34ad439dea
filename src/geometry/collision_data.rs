//! Per broad-phase-overlapping-pair bookkeeping: the `CollisionData` record
//! and the insertion-ordered map that stores one per tracked pair, keyed by
//! an order-independent fixture pair.

use std::collections::HashMap;

use crate::data::Index;
use crate::geometry::contact_constraint::ContactConstraint;
use crate::geometry::epa::Penetration;
use crate::geometry::manifold::Manifold;

/// A handle to a body, as seen from the geometry layer (an opaque arena
/// index; the dynamics layer attaches the body's actual data to it).
pub type BodyHandle = Index;

/// Dense index of a fixture within its owning body's fixture list.
pub type FixtureId = u32;

/// A fixture, globally addressable.
pub type FixtureHandle = (BodyHandle, FixtureId);

/// An unordered pair of fixture handles, used as the collision-data map key.
/// Equal regardless of argument order.
#[derive(Copy, Clone, Debug)]
pub struct PairKey(FixtureHandle, FixtureHandle);

impl PairKey {
    pub fn new(a: FixtureHandle, b: FixtureHandle) -> Self {
        if a <= b {
            PairKey(a, b)
        } else {
            PairKey(b, a)
        }
    }

    pub fn endpoints(&self) -> (FixtureHandle, FixtureHandle) {
        (self.0, self.1)
    }
}

impl PartialEq for PairKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}
impl Eq for PairKey {}

impl std::hash::Hash for PairKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
        self.1.hash(state);
    }
}

/// The four monotone-within-a-step flags tracking how far a pair's
/// processing got this tick (see `pipeline::physics_pipeline`'s detection
/// sub-pipeline).
#[derive(Copy, Clone, Debug, Default)]
pub struct PairFlags {
    pub broadphase: bool,
    pub narrowphase: bool,
    pub manifold: bool,
    pub contact_constraint: bool,
}

/// Everything tracked for one broad-phase-overlapping (fixture, fixture)
/// pair across steps.
pub struct CollisionData {
    pub fixture_a: FixtureHandle,
    pub fixture_b: FixtureHandle,
    pub flags: PairFlags,
    pub penetration: Option<Penetration>,
    pub manifold: Option<Manifold>,
    pub contact_constraint: Option<ContactConstraint>,
}

impl CollisionData {
    pub fn new(fixture_a: FixtureHandle, fixture_b: FixtureHandle) -> Self {
        CollisionData {
            fixture_a,
            fixture_b,
            flags: PairFlags::default(),
            penetration: None,
            manifold: None,
            contact_constraint: None,
        }
    }

    pub fn reset_flags(&mut self) {
        self.flags = PairFlags::default();
    }

    /// True once this pair reached the "confirmed collision" stage (a
    /// manifold with at least one point was produced this tick).
    pub fn is_manifold_collision(&self) -> bool {
        self.flags.manifold
            && self
                .manifold
                .as_ref()
                .map(|m| !m.points.is_empty())
                .unwrap_or(false)
    }
}

/// Insertion-ordered `PairKey -> CollisionData` map: a `Vec` of entries plus
/// a lookup index, so iteration order matches insertion order while lookup
/// stays O(1).
#[derive(Default)]
pub struct CollisionDataMap {
    entries: Vec<(PairKey, CollisionData)>,
    lookup: HashMap<(FixtureHandle, FixtureHandle), usize>,
}

impl CollisionDataMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalized(a: FixtureHandle, b: FixtureHandle) -> (FixtureHandle, FixtureHandle) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn contains(&self, a: FixtureHandle, b: FixtureHandle) -> bool {
        self.lookup.contains_key(&Self::normalized(a, b))
    }

    pub fn get(&self, a: FixtureHandle, b: FixtureHandle) -> Option<&CollisionData> {
        let key = Self::normalized(a, b);
        self.lookup.get(&key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, a: FixtureHandle, b: FixtureHandle) -> Option<&mut CollisionData> {
        let key = Self::normalized(a, b);
        self.lookup.get(&key).map(|&i| &mut self.entries[i].1)
    }

    /// Inserts a fresh `CollisionData` for this pair if absent; returns the
    /// existing or newly created entry.
    pub fn get_or_insert(&mut self, a: FixtureHandle, b: FixtureHandle) -> &mut CollisionData {
        let key = Self::normalized(a, b);
        if let Some(&i) = self.lookup.get(&key) {
            return &mut self.entries[i].1;
        }
        let i = self.entries.len();
        self.entries.push((PairKey::new(a, b), CollisionData::new(a, b)));
        self.lookup.insert(key, i);
        &mut self.entries[i].1
    }

    /// Removes every pair whose predicate returns `true`; preserves
    /// insertion order of the survivors.
    pub fn retain(&mut self, mut keep: impl FnMut(&CollisionData) -> bool) {
        let mut kept = Vec::with_capacity(self.entries.len());
        for (key, data) in self.entries.drain(..) {
            if keep(&data) {
                kept.push((key, data));
            }
        }
        self.entries = kept;
        self.lookup.clear();
        for (i, (key, _)) in self.entries.iter().enumerate() {
            let (a, b) = key.endpoints();
            self.lookup.insert(Self::normalized(a, b), i);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionData> {
        self.entries.iter().map(|(_, data)| data)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CollisionData> {
        self.entries.iter_mut().map(|(_, data)| data)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lookup.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::Arena;

    fn handle(arena: &mut Arena<()>) -> BodyHandle {
        arena.insert(())
    }

    #[test]
    fn pair_key_is_order_independent() {
        let mut arena = Arena::new();
        let h1 = handle(&mut arena);
        let h2 = handle(&mut arena);
        let mut map = CollisionDataMap::new();
        map.get_or_insert((h1, 0), (h2, 0));
        assert!(map.contains((h2, 0), (h1, 0)));
    }

    #[test]
    fn retain_preserves_insertion_order() {
        let mut arena = Arena::new();
        let h1 = handle(&mut arena);
        let h2 = handle(&mut arena);
        let h3 = handle(&mut arena);
        let mut map = CollisionDataMap::new();
        map.get_or_insert((h1, 0), (h2, 0));
        map.get_or_insert((h1, 0), (h3, 0));
        map.retain(|_| true);
        assert_eq!(map.len(), 2);
    }
}
