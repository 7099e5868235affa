/*!
 * Monitor
 *
 * A lock bundled with FIFO-fair, predicate-gated waiting.
 *
 * # Handoff Protocol
 *
 * Every release point (`unlock`, or a holder entering `wait_for`) scans the
 * waiter list from the head, evaluating predicates of nodes still WAITING:
 *
 * - first true node is the releasing thread's own: it keeps the monitor
 * - first true node is another waiter: its flag becomes GRANTED and it is
 *   woken; the lock word stays held, so ownership passes directly to it
 * - no true node: the lock word is released and no waiter is woken
 *
 * Predicates are only ever evaluated by the thread holding the monitor, so a
 * granted thread finds its predicate still true when it resumes. One grant is
 * made per release; the granted thread makes the next one when it releases.
 *
 * `signal_all` instead marks every waiting node SIGNALLED; those threads
 * re-acquire the monitor through `lock` and rescan from their original queue
 * position. Until they do, a scan that reaches a SIGNALLED node whose
 * predicate holds stops there and releases the lock word, so no later waiter
 * overtakes it.
 */

mod waiters;

use self::waiters::{ErasedPredicate, Waiter, WaiterId, WaiterList};
use super::config::SyncConfig;
use super::deadline::Deadline;
use super::lock::RawLock;
use super::park::{ParkedWait, Parker};
use crate::core::errors::{SyncResult, TimeoutExpired};
use crate::core::limits::{GRANTED, SIGNALLED, WAITING};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Result of a release-point scan
enum Handoff {
    /// The scanning waiter's own predicate held
    Kept,
    /// Ownership passed to another waiter
    Granted,
    /// Nobody was ready; the lock word was released
    Released,
}

/// FIFO-fair monitor
///
/// # Examples
///
/// ```
/// use yarn_sync::Monitor;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::thread;
///
/// let monitor = Arc::new(Monitor::new());
/// let ready = Arc::new(AtomicBool::new(false));
///
/// let waiter = {
///     let (monitor, ready) = (monitor.clone(), ready.clone());
///     thread::spawn(move || {
///         let mut guard = monitor.lock();
///         guard.wait_for(|| ready.load(Ordering::SeqCst));
///         guard.unlock();
///     })
/// };
///
/// let guard = monitor.lock();
/// ready.store(true, Ordering::SeqCst);
/// guard.unlock();
/// waiter.join().unwrap();
/// ```
pub struct Monitor<P: ParkedWait = Parker> {
    raw: RawLock,
    parker: P,
    spin_time: Duration,
    queued: AtomicUsize,
    waiters: UnsafeCell<WaiterList>,
}

// SAFETY: the waiter list is only accessed by the thread holding the monitor,
// which `MonitorGuard` proves; everything else is atomic.
unsafe impl<P: ParkedWait> Sync for Monitor<P> {}

impl Monitor<Parker> {
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        Self::with_parker(Parker::from_config(config), config.spin_time)
    }
}

impl Default for Monitor<Parker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParkedWait> Monitor<P> {
    pub fn with_parker(parker: P, spin_time: Duration) -> Self {
        Self {
            raw: RawLock::new(),
            parker,
            spin_time,
            queued: AtomicUsize::new(0),
            waiters: UnsafeCell::new(WaiterList::new()),
        }
    }

    /// Block until the monitor is held
    pub fn lock(&self) -> MonitorGuard<'_, P> {
        self.enter();
        MonitorGuard { monitor: self }
    }

    pub fn try_lock(&self) -> Option<MonitorGuard<'_, P>> {
        self.raw.try_lock().then(|| MonitorGuard { monitor: self })
    }

    pub fn lock_timeout(&self, timeout: Duration) -> SyncResult<MonitorGuard<'_, P>> {
        if self
            .raw
            .acquire(&self.parker, self.spin_time, Deadline::after(timeout))
        {
            Ok(MonitorGuard { monitor: self })
        } else {
            debug!(?timeout, "monitor entry timed out");
            Err(TimeoutExpired::monitor(timeout))
        }
    }

    /// Number of threads currently inside `wait_for` (racy, diagnostics only)
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Racy snapshot for diagnostics
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    fn enter(&self) {
        let acquired = self
            .raw
            .acquire(&self.parker, self.spin_time, Deadline::never());
        debug_assert!(acquired);
    }

    /// # Safety
    ///
    /// The calling thread must hold the monitor, and the returned borrow must
    /// end before the monitor is released or handed off.
    #[allow(clippy::mut_from_ref)]
    unsafe fn waiters(&self) -> &mut WaiterList {
        &mut *self.waiters.get()
    }

    /// Grant the monitor to the first ready waiter, or release it
    ///
    /// # Safety
    ///
    /// The calling thread must hold the monitor. Unless `Kept` is returned it
    /// no longer does.
    unsafe fn hand_off(&self, own: Option<WaiterId>) -> Handoff {
        let waiters = self.waiters();
        if waiters.is_empty() {
            self.raw.release(&self.parker);
            return Handoff::Released;
        }

        let chosen = waiters
            .iter()
            .filter(|(_, waiter)| waiter.flag.load(Ordering::Relaxed) != GRANTED)
            .find(|(_, waiter)| (waiter.predicate)())
            .map(|(id, waiter)| (id, Arc::clone(&waiter.flag)));

        match chosen {
            Some((id, _)) if Some(id) == own => Handoff::Kept,
            Some((_, flag)) if flag.load(Ordering::Relaxed) == SIGNALLED => {
                // That thread is already heading back through `enter` and will
                // claim the monitor in its own position
                trace!("monitor released to signalled waiter");
                self.raw.release(&self.parker);
                Handoff::Released
            }
            Some((_, flag)) => {
                trace!("monitor granted to queued waiter");
                flag.store(GRANTED, Ordering::Release);
                self.parker.wake_one(&flag);
                Handoff::Granted
            }
            None => {
                self.raw.release(&self.parker);
                Handoff::Released
            }
        }
    }

    /// Park until `flag` leaves WAITING; returns the new state
    fn block_on(&self, flag: &AtomicU32) -> u32 {
        loop {
            let state = flag.load(Ordering::Acquire);
            if state != WAITING {
                return state;
            }
            trace!(backend = self.parker.name(), "parking on monitor wake flag");
            self.parker.wait(flag, WAITING, None);
        }
    }
}

impl<P: ParkedWait> std::fmt::Debug for Monitor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("locked", &self.raw.is_locked())
            .field("queued", &self.queued())
            .field("backend", &self.parker.name())
            .finish()
    }
}

/// Proof that the current thread holds a `Monitor`
///
/// Dropping the guard is the same as [`MonitorGuard::unlock`].
#[must_use = "if unused the Monitor will immediately unlock"]
pub struct MonitorGuard<'a, P: ParkedWait = Parker> {
    monitor: &'a Monitor<P>,
}

impl<'a, P: ParkedWait> MonitorGuard<'a, P> {
    /// Wait until `predicate` holds, in arrival order with other waiters
    ///
    /// Returns at once if no earlier waiter is ready and `predicate` already
    /// holds. Otherwise the monitor is handed to the first ready earlier waiter
    /// (or released) and this thread sleeps until a later release point grants
    /// it ownership. On return the monitor is held and `predicate` was true when
    /// last evaluated by the holder.
    ///
    /// `predicate` runs on whichever thread holds the monitor and must not panic.
    pub fn wait_for<F>(&mut self, predicate: F)
    where
        F: Fn() -> bool + Sync,
    {
        let monitor = self.monitor;
        let predicate: &(dyn Fn() -> bool + Sync) = &predicate;
        // SAFETY: `_node` unlinks the waiter before `predicate` is dropped.
        let erased = unsafe {
            std::mem::transmute::<&(dyn Fn() -> bool + Sync + '_), ErasedPredicate>(predicate)
        };

        let flag = Arc::new(AtomicU32::new(WAITING));
        // SAFETY: the guard proves the monitor is held.
        let id = unsafe {
            monitor.waiters().push_back(Waiter {
                predicate: erased,
                flag: Arc::clone(&flag),
            })
        };
        monitor.queued.fetch_add(1, Ordering::SeqCst);
        let _node = QueuedNode { monitor, id };

        loop {
            // SAFETY: held on first entry, and again after GRANTED or `enter`.
            if let Handoff::Kept = unsafe { monitor.hand_off(Some(id)) } {
                return;
            }

            match monitor.block_on(&flag) {
                GRANTED => return,
                state => {
                    debug_assert_eq!(state, SIGNALLED);
                    monitor.enter();
                    flag.store(WAITING, Ordering::Relaxed);
                }
            }
        }
    }

    /// Wake every waiter without evaluating predicates
    ///
    /// The caller keeps the monitor. Woken threads compete for it through
    /// `lock` and go back to waiting unless their predicate holds.
    pub fn signal_all(&self) {
        // SAFETY: the guard proves the monitor is held.
        let flags: Vec<Arc<AtomicU32>> = unsafe { self.monitor.waiters() }
            .iter()
            .filter(|(_, waiter)| waiter.flag.load(Ordering::Relaxed) == WAITING)
            .map(|(_, waiter)| Arc::clone(&waiter.flag))
            .collect();

        trace!(count = flags.len(), "signalling all monitor waiters");
        for flag in &flags {
            flag.store(SIGNALLED, Ordering::Release);
            self.monitor.parker.wake_one(flag);
        }
    }

    /// Release, granting the monitor to the first waiter whose predicate holds
    pub fn unlock(self) {
        // Drop performs the handoff
    }

    /// Release without evaluating any waiter's predicate
    ///
    /// Queued waiters stay asleep until a later `unlock` or `wait_for` scan
    /// finds them ready.
    pub fn silent_unlock(self) {
        let monitor = self.monitor;
        std::mem::forget(self);
        monitor.raw.release(&monitor.parker);
    }

    /// The monitor this guard holds
    pub fn monitor(&self) -> &'a Monitor<P> {
        self.monitor
    }
}

impl<P: ParkedWait> Drop for MonitorGuard<'_, P> {
    fn drop(&mut self) {
        // SAFETY: the guard proves the monitor is held.
        unsafe {
            self.monitor.hand_off(None);
        }
    }
}

/// Unlinks a `wait_for` node on every exit path, including unwinding out of a
/// predicate (which only happens while this thread holds the monitor)
struct QueuedNode<'a, P: ParkedWait> {
    monitor: &'a Monitor<P>,
    id: WaiterId,
}

impl<P: ParkedWait> Drop for QueuedNode<'_, P> {
    fn drop(&mut self) {
        // SAFETY: every exit from `wait_for` happens with the monitor held.
        let remaining = unsafe {
            let waiters = self.monitor.waiters();
            waiters.remove(self.id);
            waiters.len()
        };
        let previous = self.monitor.queued.fetch_sub(1, Ordering::SeqCst);
        debug_assert_eq!(previous - 1, remaining, "queued count out of step with waiter list");
    }
}
