/*!
 * Condition
 *
 * Wait/notify paired with an external `Lock`.
 *
 * Every `wait` and every notify bumps the generation word, and a waiter parks
 * expecting the value its own bump produced. A notify that lands after the
 * waiter released the lock but before it parked changes the word, so the park
 * returns immediately instead of sleeping through the notify.
 */

use super::config::SyncConfig;
use super::lock::Lock;
use super::park::{ParkedWait, Parker};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

/// Condition variable
///
/// Spurious wakeups are possible; loop on the awaited condition, or use
/// [`Condition::wait_while`].
pub struct Condition<P: ParkedWait = Parker> {
    generation: AtomicU32,
    waiters: AtomicU32,
    parker: P,
}

impl Condition<Parker> {
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        Self::with_parker(Parker::from_config(config))
    }
}

impl Default for Condition<Parker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParkedWait> Condition<P> {
    pub fn with_parker(parker: P) -> Self {
        Self {
            generation: AtomicU32::new(0),
            waiters: AtomicU32::new(0),
            parker,
        }
    }

    /// Release `lock`, sleep until notified (or spuriously woken), re-acquire `lock`
    ///
    /// The caller must hold `lock`.
    pub fn wait<Q: ParkedWait>(&self, lock: &Lock<Q>) {
        self.waiters.fetch_add(1, Ordering::SeqCst);
        let expected = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);

        lock.unlock();
        trace!(generation = expected, "parking on condition");
        self.parker.wait(&self.generation, expected, None);
        self.waiters.fetch_sub(1, Ordering::SeqCst);

        lock.lock();
    }

    /// Wait for as long as `condition` returns true
    ///
    /// `condition` is evaluated with `lock` held.
    pub fn wait_while<Q: ParkedWait>(&self, lock: &Lock<Q>, mut condition: impl FnMut() -> bool) {
        while condition() {
            self.wait(lock);
        }
    }

    /// Wake one waiter, if any
    pub fn notify(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) != 0 {
            self.parker.wake_one(&self.generation);
        }
    }

    /// Wake every current waiter
    pub fn notify_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) != 0 {
            self.parker.wake_all(&self.generation);
        }
    }
}

impl<P: ParkedWait> std::fmt::Debug for Condition<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("waiters", &self.waiters.load(Ordering::Relaxed))
            .field("backend", &self.parker.name())
            .finish()
    }
}
