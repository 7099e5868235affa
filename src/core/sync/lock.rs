/*!
 * Lock
 *
 * Spin-then-park mutual exclusion over a single 32-bit word.
 *
 * # Protocol
 *
 * - Acquire: read-only spin (CAS only when the word reads UNLOCKED), then
 *   register as a waiter and park expecting LOCKED. A wake is a hint, not a
 *   grant: every wake re-enters the spin/CAS loop.
 * - Release: store UNLOCKED, then wake one parked thread only if the waiter
 *   counter is non-zero.
 *
 * The waiter counter only skips wake calls. The release store and the counter
 * load are both SeqCst, as are the counter increment and the backend's re-read
 * of the word, so either the releaser sees the waiter or the waiter sees the
 * unlocked word and never sleeps.
 */

use super::config::SyncConfig;
use super::deadline::{spin_until, Deadline};
use super::park::{ParkedWait, Parker};
use crate::core::errors::{SyncResult, TimeoutExpired};
use crate::core::limits::{LOCKED, UNLOCKED};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Lock word plus waiter counter, shared by `Lock` and `Monitor`
#[derive(Debug)]
pub(crate) struct RawLock {
    state: AtomicU32,
    waiters: AtomicU32,
}

impl RawLock {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
            waiters: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn try_lock(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub(crate) fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) == LOCKED
    }

    pub(crate) fn waiters(&self) -> u32 {
        self.waiters.load(Ordering::Relaxed)
    }

    /// Spin, park and retry until acquired or `deadline` passes
    ///
    /// Returns `false` only after the deadline has been observed as expired.
    pub(crate) fn acquire<P: ParkedWait>(
        &self,
        parker: &P,
        spin_time: Duration,
        deadline: Deadline,
    ) -> bool {
        loop {
            if spin_until(spin_time, &deadline, || {
                self.state.load(Ordering::Relaxed) == UNLOCKED && self.try_lock()
            }) {
                return true;
            }

            if deadline.has_expired() {
                return false;
            }

            trace!(backend = parker.name(), "parking on lock word");
            self.waiters.fetch_add(1, Ordering::SeqCst);
            parker.wait(&self.state, LOCKED, deadline.remaining());
            self.waiters.fetch_sub(1, Ordering::SeqCst);

            if deadline.has_expired() {
                return false;
            }
        }
    }

    pub(crate) fn release<P: ParkedWait>(&self, parker: &P) {
        debug_assert_eq!(
            self.state.load(Ordering::Relaxed),
            LOCKED,
            "released a lock that was not held"
        );

        self.state.store(UNLOCKED, Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) != 0 {
            parker.wake_one(&self.state);
        }
    }
}

/// Mutual-exclusion lock with tunable spin time and timed acquisition
///
/// No ownership is tracked: unlocking from another thread is allowed, and
/// unlocking a free lock is a contract violation caught only by debug assertions.
///
/// # Examples
///
/// ```
/// use yarn_sync::Lock;
/// use std::time::Duration;
///
/// let lock = Lock::new();
/// lock.lock();
/// assert!(!lock.try_lock());
/// lock.unlock();
///
/// lock.lock_timeout(Duration::from_millis(10)).unwrap();
/// lock.unlock();
/// ```
pub struct Lock<P: ParkedWait = Parker> {
    raw: RawLock,
    parker: P,
    spin_time: Duration,
}

impl Lock<Parker> {
    /// Create a lock with the default configuration
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        Self::with_parker(Parker::from_config(config), config.spin_time)
    }
}

impl Default for Lock<Parker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParkedWait> Lock<P> {
    /// Create a lock over a caller-supplied parking backend
    pub fn with_parker(parker: P, spin_time: Duration) -> Self {
        Self {
            raw: RawLock::new(),
            parker,
            spin_time,
        }
    }

    /// Acquire without blocking
    #[inline]
    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    /// Block until acquired
    pub fn lock(&self) {
        let acquired = self
            .raw
            .acquire(&self.parker, self.spin_time, Deadline::never());
        debug_assert!(acquired);
    }

    /// Block until acquired or `timeout` elapses
    ///
    /// Never fails before `timeout` has passed on the monotonic clock; may fail
    /// up to one scheduling quantum after it.
    pub fn lock_timeout(&self, timeout: Duration) -> SyncResult<()> {
        if self
            .raw
            .acquire(&self.parker, self.spin_time, Deadline::after(timeout))
        {
            Ok(())
        } else {
            debug!(?timeout, "lock acquisition timed out");
            Err(TimeoutExpired::lock(timeout))
        }
    }

    /// Release the lock
    #[inline]
    pub fn unlock(&self) {
        self.raw.release(&self.parker);
    }

    /// Acquire and return a guard that unlocks on drop
    pub fn guard(&self) -> LockGuard<'_, P> {
        self.lock();
        LockGuard { lock: self }
    }

    pub fn guard_timeout(&self, timeout: Duration) -> SyncResult<LockGuard<'_, P>> {
        self.lock_timeout(timeout)?;
        Ok(LockGuard { lock: self })
    }

    /// Racy snapshot for diagnostics
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    pub fn spin_time(&self) -> Duration {
        self.spin_time
    }

    pub fn backend_name(&self) -> &'static str {
        self.parker.name()
    }
}

impl<P: ParkedWait> std::fmt::Debug for Lock<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("locked", &self.raw.is_locked())
            .field("waiters", &self.raw.waiters())
            .field("backend", &self.parker.name())
            .field("spin_time", &self.spin_time)
            .finish()
    }
}

/// RAII guard for a held `Lock`
#[must_use = "if unused the Lock will immediately unlock"]
pub struct LockGuard<'a, P: ParkedWait = Parker> {
    lock: &'a Lock<P>,
}

impl<'a, P: ParkedWait> LockGuard<'a, P> {
    /// The lock this guard holds
    pub fn as_lock(&self) -> &'a Lock<P> {
        self.lock
    }
}

impl<P: ParkedWait> Drop for LockGuard<'_, P> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
