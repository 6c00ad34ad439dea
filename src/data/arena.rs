//! A generational arena, used as the backing store for bodies and joints.
//!
//! A handle ([`Index`]) is a dense array slot plus a generation counter;
//! reusing a freed slot bumps the generation so stale handles are detected
//! instead of silently aliasing a new element.

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A handle into an [`Arena`]. Two handles compare equal only if they share
/// both the slot and the generation, so a handle to a removed-then-reused
/// slot never matches the new occupant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Index {
    index: u32,
    generation: u32,
}

impl Index {
    /// A handle that never compares equal to any handle returned by an
    /// `Arena`, used as a "no value" sentinel where `Option<Index>` would
    /// otherwise have to be threaded through hot paths.
    pub fn invalid() -> Self {
        Index {
            index: u32::MAX,
            generation: u32::MAX,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Free { generation: u32, next_free: Option<u32> },
}

/// A `Vec`-backed, generation-checked, freelist-reusing arena.
#[derive(Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Arena<T> {
    #[cfg_attr(feature = "serde-serialize", serde(skip))]
    slots: Vec<SlotRepr<T>>,
    #[cfg_attr(feature = "serde-serialize", serde(skip))]
    free_head: Option<u32>,
    len: usize,
}

// `serde` can't easily derive through the private `Slot` enum without extra
// plumbing; since full-world serialization is out of scope this
// type simply isn't serialized. The `serde-serialize` feature only needs to
// compile the `Index` handles that flow through the public API.
struct SlotRepr<T>(Slot<T>);

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value, returning its handle.
    pub fn insert(&mut self, value: T) -> Index {
        if let Some(free) = self.free_head {
            let slot = &mut self.slots[free as usize];
            let generation = match slot.0 {
                Slot::Free {
                    generation,
                    next_free,
                } => {
                    self.free_head = next_free;
                    generation
                }
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };
            slot.0 = Slot::Occupied { generation, value };
            self.len += 1;
            Index {
                index: free,
                generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(SlotRepr(Slot::Occupied {
                generation: 0,
                value,
            }));
            self.len += 1;
            Index {
                index,
                generation: 0,
            }
        }
    }

    /// Removes and returns the value at `index`, if the handle is still
    /// valid (same slot *and* generation).
    pub fn remove(&mut self, index: Index) -> Option<T> {
        let slot = self.slots.get_mut(index.index as usize)?;
        match &slot.0 {
            Slot::Occupied { generation, .. } if *generation == index.generation => {
                let next_generation = generation.wrapping_add(1);
                let old = std::mem::replace(
                    &mut slot.0,
                    Slot::Free {
                        generation: next_generation,
                        next_free: self.free_head,
                    },
                );
                self.free_head = Some(index.index);
                self.len -= 1;
                match old {
                    Slot::Occupied { value, .. } => Some(value),
                    Slot::Free { .. } => unreachable!(),
                }
            }
            _ => None,
        }
    }

    pub fn contains(&self, index: Index) -> bool {
        matches!(
            self.slots.get(index.index as usize).map(|s| &s.0),
            Some(Slot::Occupied { generation, .. }) if *generation == index.generation
        )
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        match self.slots.get(index.index as usize).map(|s| &s.0) {
            Some(Slot::Occupied { generation, value }) if *generation == index.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        match self.slots.get_mut(index.index as usize).map(|s| &mut s.0) {
            Some(Slot::Occupied { generation, value }) if *generation == index.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Gets two *distinct* slots mutably at once, used by the solver to
    /// borrow both endpoints of a contact/joint without a RefCell.
    pub fn get2_mut(&mut self, a: Index, b: Index) -> (Option<&mut T>, Option<&mut T>) {
        assert_ne!(a.index, b.index, "get2_mut requires distinct slots");
        if a.index < b.index {
            let (left, right) = self.slots.split_at_mut(b.index as usize);
            (
                slot_ref_mut(left.get_mut(a.index as usize), a.generation),
                slot_ref_mut(right.get_mut(0), b.generation),
            )
        } else {
            let (left, right) = self.slots.split_at_mut(a.index as usize);
            (
                slot_ref_mut(right.get_mut(0), a.generation),
                slot_ref_mut(left.get_mut(b.index as usize), b.generation),
            )
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            match &slot.0 {
                Slot::Occupied { generation, value } => Some((
                    Index {
                        index: i as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Free { .. } => None,
            }
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Index, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            match &mut slot.0 {
                Slot::Occupied { generation, value } => Some((
                    Index {
                        index: i as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Free { .. } => None,
            }
        })
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}

fn slot_ref_mut<T>(slot: Option<&mut SlotRepr<T>>, generation: u32) -> Option<&mut T> {
    match slot.map(|s| &mut s.0) {
        Some(Slot::Occupied {
            generation: g,
            value,
        }) if *g == generation => Some(value),
        _ => None,
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &T {
        self.get(index).expect("invalid arena index")
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut T {
        self.get_mut(index).expect("invalid arena index")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_get_remove_roundtrip() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        assert_eq!(arena.get(a), Some(&1));
        assert_eq!(arena.get(b), Some(&2));
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a).unwrap();
        let b = arena.insert(2);
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
    }

    #[test]
    fn get2_mut_distinct_slots() {
        let mut arena = Arena::new();
        let a = arena.insert(10);
        let b = arena.insert(20);
        let (va, vb) = arena.get2_mut(a, b);
        *va.unwrap() += 1;
        *vb.unwrap() += 1;
        assert_eq!(arena.get(a), Some(&11));
        assert_eq!(arena.get(b), Some(&21));
    }
}
