/*!
 * Waiter List
 *
 * FIFO queue of monitor waiters stored in an index arena. Slots are recycled
 * through a free list; an id stays valid from `push_back` until `remove`.
 */

use std::sync::atomic::AtomicU32;
use std::sync::Arc;

/// Predicate with its borrow lifetime erased
///
/// Only sound while the owning `wait_for` frame is alive, which is guaranteed
/// because that frame removes its node before returning.
pub(crate) type ErasedPredicate = &'static (dyn Fn() -> bool + Sync);

/// Stable handle to a queued waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WaiterId(usize);

/// A queued thread: its predicate and the flag word it parks on
pub(crate) struct Waiter {
    pub(crate) predicate: ErasedPredicate,
    pub(crate) flag: Arc<AtomicU32>,
}

struct Slot {
    waiter: Option<Waiter>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
pub(crate) struct WaiterList {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl WaiterList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append at the tail (latest arrival)
    pub(crate) fn push_back(&mut self, waiter: Waiter) -> WaiterId {
        let slot = Slot {
            waiter: Some(waiter),
            prev: self.tail,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = slot;
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        WaiterId(index)
    }

    /// Unlink a waiter and recycle its slot
    pub(crate) fn remove(&mut self, id: WaiterId) -> Option<Waiter> {
        let WaiterId(index) = id;
        let slot = self.slots.get_mut(index)?;
        let waiter = slot.waiter.take()?;
        let (prev, next) = (slot.prev.take(), slot.next.take());

        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }

        self.free.push(index);
        self.len -= 1;
        Some(waiter)
    }

    /// Waiters in arrival order
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}

pub(crate) struct Iter<'a> {
    list: &'a WaiterList,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (WaiterId, &'a Waiter);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.list.slots[index];
        self.cursor = slot.next;
        slot.waiter.as_ref().map(|waiter| (WaiterId(index), waiter))
    }
}
