/*!
 * Condvar Parking Backend with Sharded Architecture
 *
 * Cross-platform fallback using parking_lot::Condvar for reliability.
 *
 * # Design: Fixed Sharded Array
 *
 * Each backend instance owns a fixed array of mutex/condvar slots; a word is
 * mapped to a slot by hashing its address. The word is re-read while the slot
 * mutex is held, and wakers take the same mutex before notifying, so a
 * store-then-wake cannot slip between a sleeper's check and its wait.
 *
 * Trade-off: several words may share a slot, so every wake broadcasts to the
 * slot and sleepers for other words see a spurious wakeup.
 */

use super::traits::{ParkResult, ParkedWait, WakeResult};
use crate::core::limits::CONDVAR_PARKING_SLOTS;
use parking_lot::{Condvar, Mutex};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

const SLOT_MASK: usize = CONDVAR_PARKING_SLOTS - 1;

/// A single condvar slot with waiter count
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
struct CondvarSlot {
    condvar: Condvar,
    mutex: Mutex<()>,
    waiters: AtomicUsize,
}

impl CondvarSlot {
    const fn new() -> Self {
        Self {
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
            waiters: AtomicUsize::new(0),
        }
    }
}

/// Condvar-based parking with a fixed sharded slot table
pub struct CondvarWait {
    /// Fixed array of condvar slots (never resizes, stable addresses)
    slots: Box<[CondvarSlot; CONDVAR_PARKING_SLOTS]>,
}

impl CondvarWait {
    pub fn new() -> Self {
        Self {
            slots: Box::new([const { CondvarSlot::new() }; CONDVAR_PARKING_SLOTS]),
        }
    }

    /// Hash word address to slot
    #[inline]
    fn slot(&self, word: &AtomicU32) -> &CondvarSlot {
        let mut hasher = ahash::AHasher::default();
        (word as *const AtomicU32 as usize).hash(&mut hasher);
        &self.slots[(hasher.finish() as usize) & SLOT_MASK]
    }
}

impl Default for CondvarWait {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CondvarWait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CondvarWait")
            .field("slots", &CONDVAR_PARKING_SLOTS)
            .finish()
    }
}

impl ParkedWait for CondvarWait {
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> ParkResult {
        let slot = self.slot(word);
        let mut guard = slot.mutex.lock();

        if word.load(Ordering::SeqCst) != expected {
            return ParkResult::Mismatch;
        }

        slot.waiters.fetch_add(1, Ordering::Relaxed);

        let timed_out = match timeout {
            Some(timeout) => slot.condvar.wait_for(&mut guard, timeout).timed_out(),
            None => {
                slot.condvar.wait(&mut guard);
                false
            }
        };

        slot.waiters.fetch_sub(1, Ordering::Relaxed);

        if timed_out {
            ParkResult::TimedOut
        } else {
            ParkResult::Woken
        }
    }

    fn wake(&self, word: &AtomicU32, count: u32) -> WakeResult {
        let slot = self.slot(word);

        // Serializes against a sleeper between its check and its wait
        let _guard = slot.mutex.lock();

        let waiting = slot.waiters.load(Ordering::Relaxed);
        if waiting == 0 || count == 0 {
            return WakeResult::NoWaiters;
        }

        // The slot may be shared with other words, so a targeted notify_one
        // could land on the wrong sleeper
        slot.condvar.notify_all();
        WakeResult::Woken(waiting.min(count as usize))
    }

    fn name(&self) -> &'static str {
        "condvar"
    }
}
