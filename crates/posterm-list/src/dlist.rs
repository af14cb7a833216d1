//! Doubly linked ownership list

use crate::arena::{Arena, NodeId, NIL};
use std::cmp::Ordering;
use std::fmt;

/// Doubly linked list owning its elements.
///
/// Traversal order is head to tail. The compositor keeps active layers in a
/// `DList` ordered back-to-front, so the tail is the frontmost layer.
pub struct DList<T> {
    arena: Arena<T>,
    head: u32,
    tail: u32,
}

impl<T> Default for DList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Whether the list holds no elements
    pub fn is_empty(&self) -> bool {
        self.head == NIL
    }

    /// Insert `value` before the current head
    pub fn add_to_head(&mut self, value: T) -> NodeId {
        let idx = self.arena.alloc(value);
        self.arena.set_next(idx, self.head);
        if self.head == NIL {
            self.tail = idx;
        } else {
            self.arena.set_prev(self.head, idx);
        }
        self.head = idx;
        self.arena.handle(idx)
    }

    /// Insert `value` after the current tail
    pub fn add_to_tail(&mut self, value: T) -> NodeId {
        let idx = self.arena.alloc(value);
        self.arena.set_prev(idx, self.tail);
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.arena.set_next(self.tail, idx);
        }
        self.tail = idx;
        self.arena.handle(idx)
    }

    /// Insert `value` directly after `anchor`.
    ///
    /// Fails, handing `value` back, when `anchor` is not linked in this list.
    pub fn add_after_node(&mut self, anchor: NodeId, value: T) -> Result<NodeId, T> {
        let Some(at) = self.arena.resolve(anchor) else {
            return Err(value);
        };
        if at == self.tail {
            return Ok(self.add_to_tail(value));
        }

        let next = self.arena.next(at);
        let idx = self.arena.alloc(value);
        self.arena.set_prev(idx, at);
        self.arena.set_next(idx, next);
        self.arena.set_next(at, idx);
        self.arena.set_prev(next, idx);
        Ok(self.arena.handle(idx))
    }

    /// Insert `value` directly before `anchor`.
    ///
    /// Fails, handing `value` back, when `anchor` is not linked in this list.
    pub fn add_before_node(&mut self, anchor: NodeId, value: T) -> Result<NodeId, T> {
        let Some(at) = self.arena.resolve(anchor) else {
            return Err(value);
        };
        if at == self.head {
            return Ok(self.add_to_head(value));
        }

        let prev = self.arena.prev(at);
        let idx = self.arena.alloc(value);
        self.arena.set_prev(idx, prev);
        self.arena.set_next(idx, at);
        self.arena.set_next(prev, idx);
        self.arena.set_prev(at, idx);
        Ok(self.arena.handle(idx))
    }

    /// Unlink an element and return ownership of it.
    ///
    /// Stale or foreign handles are ignored and the list is left untouched.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let idx = self.arena.resolve(id)?;
        self.unlink(idx);
        self.arena.release(idx)
    }

    /// Like [`remove`](Self::remove), but first verifies membership by
    /// walking the links.
    pub fn remove_safe(&mut self, id: NodeId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        self.remove(id)
    }

    /// Whether `id` is reachable from the head
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

    /// Position of `id` in traversal order (linear scan)
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.ids().position(|linked| linked == id)
    }

    pub fn head(&self) -> Option<NodeId> {
        self.link(self.head)
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.link(self.tail)
    }

    /// Element after `id`
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.arena.resolve(id)?;
        self.link(self.arena.next(idx))
    }

    /// Element before `id`
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.arena.resolve(id)?;
        self.link(self.arena.prev(idx))
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        let idx = self.arena.resolve(id)?;
        self.arena.value(idx)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let idx = self.arena.resolve(id)?;
        self.arena.value_mut(idx)
    }

    /// First element (head to tail) matching `pred`
    pub fn find<P>(&self, mut pred: P) -> Option<NodeId>
    where
        P: FnMut(&T) -> bool,
    {
        self.ids()
            .find(|&id| self.get(id).map_or(false, |value| pred(value)))
    }

    /// First element walking tail to head that matches `pred`
    pub fn rfind<P>(&self, mut pred: P) -> Option<NodeId>
    where
        P: FnMut(&T) -> bool,
    {
        self.ids()
            .rev()
            .find(|&id| self.get(id).map_or(false, |value| pred(value)))
    }

    /// Iterate values head to tail
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            ids: self.ids(),
            list: self,
        }
    }

    /// Iterate handles head to tail
    pub fn ids(&self) -> Ids<'_, T> {
        Ids {
            arena: &self.arena,
            front: self.head,
            back: self.tail,
            done: self.head == NIL,
        }
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

    /// Move every element out into a new list, leaving this one empty.
    ///
    /// Handles keep working against the returned list.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Stable in-place merge sort on the links.
    ///
    /// Bottom-up with fixed run sizes: runs are not detected from existing
    /// order; each pass merges adjacent runs of `insize` elements (1, 2,
    /// 4, ...) and doubles `insize`, stopping after a pass that performed
    /// at most one merge. No auxiliary storage is used. When `cmp` reports `Equal` the
    /// element that came first keeps its place in front.
    pub fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if self.head == NIL {
            return;
        }

        let mut insize = 1usize;
        loop {
            let mut p = self.head;
            let mut tail = NIL;
            let mut merges = 0usize;
            self.head = NIL;

            while p != NIL {
                merges += 1;

                // Step `insize` places along from p to find the right run
                let mut q = p;
                let mut psize = 0usize;
                for _ in 0..insize {
                    psize += 1;
                    q = self.arena.next(q);
                    if q == NIL {
                        break;
                    }
                }
                let mut qsize = insize;

                while psize > 0 || (qsize > 0 && q != NIL) {
                    let take_left = if psize == 0 {
                        false
                    } else if qsize == 0 || q == NIL {
                        true
                    } else {
                        match (self.arena.value(p), self.arena.value(q)) {
                            (Some(a), Some(b)) => cmp(a, b) != Ordering::Greater,
                            _ => true,
                        }
                    };

                    let e = if take_left {
                        let e = p;
                        p = self.arena.next(p);
                        psize -= 1;
                        e
                    } else {
                        let e = q;
                        q = self.arena.next(q);
                        qsize -= 1;
                        e
                    };

                    if tail == NIL {
                        self.head = e;
                    } else {
                        self.arena.set_next(tail, e);
                    }
                    self.arena.set_prev(e, tail);
                    tail = e;
                }

                p = q;
            }

            self.arena.set_next(tail, NIL);
            self.tail = tail;

            if merges <= 1 {
                return;
            }
            insize *= 2;
        }
    }

    fn link(&self, idx: u32) -> Option<NodeId> {
        (idx != NIL).then(|| self.arena.handle(idx))
    }

    fn unlink(&mut self, idx: u32) {
        let prev = self.arena.prev(idx);
        let next = self.arena.next(idx);

        if prev == NIL {
            self.head = next;
        } else {
            self.arena.set_next(prev, next);
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.arena.set_prev(next, prev);
        }
    }
}

impl<T: Ord> DList<T> {
    /// Stable sort by `T`'s ordering
    pub fn sort(&mut self) {
        self.sort_by(Ord::cmp);
    }
}

impl<T> Extend<T> for DList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add_to_tail(value);
        }
    }
}

impl<T> FromIterator<T> for DList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T: fmt::Debug> fmt::Debug for DList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Handle iterator, see [`DList::ids`]
pub struct Ids<'a, T> {
    arena: &'a Arena<T>,
    front: u32,
    back: u32,
    done: bool,
}

impl<T> Iterator for Ids<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.done {
            return None;
        }
        let idx = self.front;
        if idx == self.back {
            self.done = true;
        } else {
            self.front = self.arena.next(idx);
        }
        Some(self.arena.handle(idx))
    }
}

impl<T> DoubleEndedIterator for Ids<'_, T> {
    fn next_back(&mut self) -> Option<NodeId> {
        if self.done {
            return None;
        }
        let idx = self.back;
        if idx == self.front {
            self.done = true;
        } else {
            self.back = self.arena.prev(idx);
        }
        Some(self.arena.handle(idx))
    }
}

/// Value iterator, see [`DList::iter`]
pub struct Iter<'a, T> {
    ids: Ids<'a, T>,
    list: &'a DList<T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let id = self.ids.next()?;
        self.list.get(id)
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        let id = self.ids.next_back()?;
        self.list.get(id)
    }
}

impl<'a, T> IntoIterator for &'a DList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
