/*!
 * Semaphore
 *
 * Unbounded counting semaphore with the same spin/park/retry shape as `Lock`,
 * parked on the count word itself. A taker sleeps only while the count still
 * holds the too-small value it last observed (zero for single-unit takes).
 */

use super::config::SyncConfig;
use super::deadline::{spin_until, Deadline};
use super::park::{ParkedWait, Parker};
use crate::core::errors::{SyncResult, TimeoutExpired};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Counting semaphore
///
/// Gives no ordering among takers.
///
/// # Examples
///
/// ```
/// use yarn_sync::Semaphore;
///
/// let sem = Semaphore::new(1);
/// assert!(sem.try_take());
/// assert!(!sem.try_take());
/// sem.give();
/// sem.take();
/// ```
pub struct Semaphore<P: ParkedWait = Parker> {
    value: AtomicU32,
    waiters: AtomicU32,
    /// Parked takers waiting for more than one unit
    bulk_waiters: AtomicU32,
    parker: P,
    spin_time: Duration,
}

impl Semaphore<Parker> {
    pub fn new(initial: u32) -> Self {
        Self::with_config(initial, &SyncConfig::default())
    }

    pub fn with_config(initial: u32, config: &SyncConfig) -> Self {
        Self::with_parker(initial, Parker::from_config(config), config.spin_time)
    }
}

impl Default for Semaphore<Parker> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<P: ParkedWait> Semaphore<P> {
    pub fn with_parker(initial: u32, parker: P, spin_time: Duration) -> Self {
        Self {
            value: AtomicU32::new(initial),
            waiters: AtomicU32::new(0),
            bulk_waiters: AtomicU32::new(0),
            parker,
            spin_time,
        }
    }

    /// Take one unit without blocking
    ///
    /// Retries the compare-and-swap under contention for as long as the count
    /// stays non-zero; returns `false` only after observing zero.
    pub fn try_take(&self) -> bool {
        self.try_take_many(1)
    }

    /// Take `count` units at once without blocking; all or nothing
    pub fn try_take_many(&self, count: u32) -> bool {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            if current < count {
                return false;
            }
            match self.value.compare_exchange_weak(
                current,
                current - count,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Block until a unit is taken
    pub fn take(&self) {
        self.take_many(1);
    }

    /// Block until a unit is taken or `timeout` elapses
    pub fn take_timeout(&self, timeout: Duration) -> SyncResult<()> {
        self.take_many_timeout(1, timeout)
    }

    /// Block until `count` units are taken together
    pub fn take_many(&self, count: u32) {
        let taken = self.acquire(count, Deadline::never());
        debug_assert!(taken);
    }

    /// Block until `count` units are taken together or `timeout` elapses
    ///
    /// On timeout nothing has been taken.
    pub fn take_many_timeout(&self, count: u32, timeout: Duration) -> SyncResult<()> {
        if self.acquire(count, Deadline::after(timeout)) {
            Ok(())
        } else {
            debug!(count, ?timeout, "semaphore take timed out");
            Err(TimeoutExpired::take(timeout))
        }
    }

    fn acquire(&self, count: u32, deadline: Deadline) -> bool {
        let bulk = count > 1;
        loop {
            if spin_until(self.spin_time, &deadline, || self.try_take_many(count)) {
                return true;
            }

            if deadline.has_expired() {
                return false;
            }

            // Sleep only while the count stays at a value too small to take from
            let observed = self.value.load(Ordering::SeqCst);
            if observed >= count {
                continue;
            }

            trace!(backend = self.parker.name(), count, observed, "parking on semaphore");
            if bulk {
                self.bulk_waiters.fetch_add(1, Ordering::SeqCst);
            }
            self.waiters.fetch_add(1, Ordering::SeqCst);
            self.parker.wait(&self.value, observed, deadline.remaining());
            self.waiters.fetch_sub(1, Ordering::SeqCst);
            if bulk {
                self.bulk_waiters.fetch_sub(1, Ordering::SeqCst);
            }

            if deadline.has_expired() {
                return false;
            }
        }
    }

    /// Return one unit
    pub fn give(&self) {
        let previous = self.value.fetch_add(1, Ordering::SeqCst);
        debug_assert!(previous < u32::MAX, "semaphore count overflow");

        self.wake_takers(1);
    }

    /// Return `count` units at once, waking up to `count` takers
    pub fn give_many(&self, count: u32) {
        if count == 0 {
            return;
        }

        let previous = self.value.fetch_add(count, Ordering::SeqCst);
        debug_assert!(previous.checked_add(count).is_some(), "semaphore count overflow");

        self.wake_takers(count);
    }

    /// Wake up to `count` takers; broadcast while a multi-unit taker is parked
    fn wake_takers(&self, count: u32) {
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return;
        }

        if self.bulk_waiters.load(Ordering::SeqCst) != 0 {
            self.parker.wake_all(&self.value);
        } else {
            self.parker.wake(&self.value, count);
        }
    }

    /// Racy snapshot of the count, for diagnostics only
    pub fn value(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn backend_name(&self) -> &'static str {
        self.parker.name()
    }
}

impl<P: ParkedWait> std::fmt::Debug for Semaphore<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("value", &self.value())
            .field("waiters", &self.waiters.load(Ordering::Relaxed))
            .field("backend", &self.parker.name())
            .finish()
    }
}
