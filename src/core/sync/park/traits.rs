/*!
 * Parking Traits
 *
 * The wait/wake capability every primitive is built on.
 *
 * # Design: Trait-Based Abstraction for Backends
 *
 * Primitives are generic over `ParkedWait` so a portable backend can replace
 * the raw futex without touching any acquire/release logic. The default
 * `Parker` uses enum dispatch over the built-in backends.
 */

use crate::core::limits::WAKE_ALL;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Outcome of a park call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkResult {
    /// Woken by a wake call, or spuriously
    Woken,
    /// The word no longer held the expected value; the thread never slept
    Mismatch,
    /// The timeout elapsed
    TimedOut,
}

impl ParkResult {
    #[inline(always)]
    pub fn timed_out(&self) -> bool {
        matches!(self, ParkResult::TimedOut)
    }
}

/// Result of a wake operation
///
/// Compact representation (single usize) for efficient returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }

    pub(crate) fn from_count(n: usize) -> Self {
        if n == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(n)
        }
    }
}

/// Futex-like sleep/wake on a 32-bit word
///
/// Implementations must be:
/// - **Atomic with respect to the check**: `wait` sleeps only if `word == expected`
///   at the moment the backend enqueues the thread, so a store followed by a
///   wake can never be missed
/// - **Address-keyed**: `wake` reaches only threads parked on the same word
///   (backends may add spurious wakeups, never lost ones)
pub trait ParkedWait: Send + Sync {
    /// Sleep while `word == expected`, for at most `timeout`
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> ParkResult;

    /// Wake up to `count` threads parked on `word`
    fn wake(&self, word: &AtomicU32, count: u32) -> WakeResult;

    #[inline]
    fn wake_one(&self, word: &AtomicU32) -> WakeResult {
        self.wake(word, 1)
    }

    #[inline]
    fn wake_all(&self, word: &AtomicU32) -> WakeResult {
        self.wake(word, WAKE_ALL)
    }

    /// Get backend name for debugging
    fn name(&self) -> &'static str;
}
