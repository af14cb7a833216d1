//! Singly linked ownership list

use crate::arena::{Arena, NodeId, NIL};
use std::fmt;

/// Singly linked list owning its elements.
///
/// Only forward links are kept, so unlinking walks from the head to find the
/// predecessor. Used where order matters but elements are rarely removed
/// from the middle, such as the inactive layer set.
pub struct SList<T> {
    arena: Arena<T>,
    head: u32,
    tail: u32,
}

impl<T> Default for SList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            head: NIL,
            tail: NIL,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head == NIL
    }

    /// Insert `value` before the current head
    pub fn add_to_head(&mut self, value: T) -> NodeId {
        let idx = self.arena.alloc(value);
        self.arena.set_next(idx, self.head);
        if self.head == NIL {
            self.tail = idx;
        }
        self.head = idx;
        self.arena.handle(idx)
    }

    /// Insert `value` after the current tail
    pub fn add_to_tail(&mut self, value: T) -> NodeId {
        let idx = self.arena.alloc(value);
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.arena.set_next(self.tail, idx);
        }
        self.tail = idx;
        self.arena.handle(idx)
    }

    /// Insert `value` directly after `anchor`, handing it back on failure
    pub fn add_after_node(&mut self, anchor: NodeId, value: T) -> Result<NodeId, T> {
        let Some(at) = self.arena.resolve(anchor) else {
            return Err(value);
        };
        if at == self.tail {
            return Ok(self.add_to_tail(value));
        }

        let idx = self.arena.alloc(value);
        self.arena.set_next(idx, self.arena.next(at));
        self.arena.set_next(at, idx);
        Ok(self.arena.handle(idx))
    }

    /// Unlink an element and return ownership of it.
    ///
    /// The handle is checked against this list's slots; a stale or foreign
    /// handle leaves the list untouched.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let idx = self.arena.resolve(id)?;
        let prev = self.predecessor(idx)?;
        let next = self.arena.next(idx);

        if prev == NIL {
            self.head = next;
        } else {
            self.arena.set_next(prev, next);
        }
        if self.tail == idx {
            self.tail = prev;
        }

        self.arena.release(idx)
    }

    /// Like [`remove`](Self::remove), but first verifies membership by
    /// scanning from the head.
    pub fn remove_safe(&mut self, id: NodeId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        self.remove(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids().any(|linked| linked == id)
    }

    /// Drop every element
    pub fn purge(&mut self) {
        self.arena.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Number of linked elements (linear scan)
    pub fn count(&self) -> usize {
        self.ids().count()
    }

    /// Handle of the element at position `i` (linear scan)
    pub fn index(&self, i: usize) -> Option<NodeId> {
        self.ids().nth(i)
    }

    pub fn head(&self) -> Option<NodeId> {
        (self.head != NIL).then(|| self.arena.handle(self.head))
    }

    pub fn tail(&self) -> Option<NodeId> {
        (self.tail != NIL).then(|| self.arena.handle(self.tail))
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.arena.resolve(id)?;
        let next = self.arena.next(idx);
        (next != NIL).then(|| self.arena.handle(next))
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        let idx = self.arena.resolve(id)?;
        self.arena.value(idx)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let idx = self.arena.resolve(id)?;
        self.arena.value_mut(idx)
    }

    /// First element matching `pred`
    pub fn find<P>(&self, mut pred: P) -> Option<NodeId>
    where
        P: FnMut(&T) -> bool,
    {
        self.ids()
            .find(|&id| self.get(id).map_or(false, |value| pred(value)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.ids().filter_map(move |id| self.get(id))
    }

    /// Iterate handles head to tail
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            if cur == NIL {
                return None;
            }
            let idx = cur;
            cur = self.arena.next(idx);
            Some(self.arena.handle(idx))
        })
    }

    /// Iterate elements mutably, head to tail
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        let mut order = Vec::new();
        let mut cur = self.head;
        while cur != NIL {
            order.push(cur);
            cur = self.arena.next(cur);
        }
        self.arena.values_mut_in(order)
    }

    /// Visit every element mutably, head to tail
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(NodeId, &mut T),
    {
        let mut cur = self.head;
        while cur != NIL {
            let next = self.arena.next(cur);
            let id = self.arena.handle(cur);
            if let Some(value) = self.arena.value_mut(cur) {
                f(id, value);
            }
            cur = next;
        }
    }

    /// Move every element out into a new list, leaving this one empty
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Slot linking to `idx`, `NIL` when `idx` is the head, `None` when the
    /// slot is allocated but not reachable.
    fn predecessor(&self, idx: u32) -> Option<u32> {
        if self.head == idx {
            return Some(NIL);
        }
        let mut cur = self.head;
        while cur != NIL {
            let next = self.arena.next(cur);
            if next == idx {
                return Some(cur);
            }
            cur = next;
        }
        None
    }
}

impl<T> Extend<T> for SList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add_to_tail(value);
        }
    }
}

impl<T> FromIterator<T> for SList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T: fmt::Debug> fmt::Debug for SList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
