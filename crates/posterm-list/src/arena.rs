//! Slot storage shared by both list flavours

use std::sync::atomic::{AtomicU32, Ordering};

/// Sentinel for "no link".
pub(crate) const NIL: u32 = u32::MAX;

static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

/// Handle to an element linked into a [`DList`](crate::DList) or
/// [`SList`](crate::SList).
///
/// A handle stays valid until its element is removed. Handles from another
/// list, or to a removed element, are rejected by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) owner: u32,
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub(crate) value: Option<T>,
    pub(crate) prev: u32,
    pub(crate) next: u32,
    generation: u32,
}

#[derive(Debug)]
pub(crate) struct Arena<T> {
    pub(crate) slots: Vec<Slot<T>>,
    free: Vec<u32>,
    owner: u32,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Stores `value` in a free slot (reusing one if possible) with no links.
    pub(crate) fn alloc(&mut self, value: T) -> u32 {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.value = Some(value);
            slot.prev = NIL;
            slot.next = NIL;
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                value: Some(value),
                prev: NIL,
                next: NIL,
                generation: 0,
            });
            idx
        }
    }

    /// Takes the value out of a slot and recycles it.
    ///
    /// Bumping the generation makes every outstanding handle stale.
    pub(crate) fn release(&mut self, idx: u32) -> Option<T> {
        let slot = self.slots.get_mut(idx as usize)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.prev = NIL;
        slot.next = NIL;
        self.free.push(idx);
        Some(value)
    }

    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            owner: self.owner,
            idx,
            generation: self.slots[idx as usize].generation,
        }
    }

    /// Resolves a handle to a live slot index.
    pub(crate) fn resolve(&self, id: NodeId) -> Option<u32> {
        if id.owner != self.owner {
            return None;
        }
        let slot = self.slots.get(id.idx as usize)?;
        (slot.generation == id.generation && slot.value.is_some()).then_some(id.idx)
    }

    pub(crate) fn value(&self, idx: u32) -> Option<&T> {
        self.slots.get(idx as usize)?.value.as_ref()
    }

    pub(crate) fn value_mut(&mut self, idx: u32) -> Option<&mut T> {
        self.slots.get_mut(idx as usize)?.value.as_mut()
    }

    /// Mutable references to the values at `order`, in that order
    pub(crate) fn values_mut_in(&mut self, order: Vec<u32>) -> impl Iterator<Item = &mut T> + '_ {
        let mut by_slot: Vec<Option<&mut T>> = self
            .slots
            .iter_mut()
            .map(|slot| slot.value.as_mut())
            .collect();
        order
            .into_iter()
            .filter_map(move |idx| by_slot.get_mut(idx as usize).and_then(Option::take))
    }

    pub(crate) fn next(&self, idx: u32) -> u32 {
        self.slots[idx as usize].next
    }

    pub(crate) fn prev(&self, idx: u32) -> u32 {
        self.slots[idx as usize].prev
    }

    pub(crate) fn set_next(&mut self, idx: u32, next: u32) {
        self.slots[idx as usize].next = next;
    }

    pub(crate) fn set_prev(&mut self, idx: u32, prev: u32) {
        self.slots[idx as usize].prev = prev;
    }

    /// Drops every stored value and forgets all slots.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        // Old handles must not resolve against reused indices.
        self.owner = NEXT_OWNER.fetch_add(1, Ordering::Relaxed);
    }
}
