/*!
 * Deadlines and Spinning
 *
 * Converts a caller's relative timeout into an absolute monotonic deadline once,
 * then hands out the remaining duration on every park/retry cycle.
 */

use std::time::{Duration, Instant};

/// Absolute monotonic deadline; `None` waits forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub(crate) const fn never() -> Self {
        Self { at: None }
    }

    /// Deadline `timeout` from now (unrepresentable instants wait forever)
    pub(crate) fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
        }
    }

    /// Time left, saturating at zero; `None` for an unbounded wait
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    #[inline]
    pub(crate) fn has_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Earlier of `instant` and this deadline
    fn cap(&self, instant: Instant) -> Instant {
        match self.at {
            Some(at) if at < instant => at,
            _ => instant,
        }
    }
}

/// Poll `attempt` until it succeeds or `spin_time` (bounded by `deadline`) runs out
///
/// `attempt` always runs at least once, even with a zero spin time or an
/// expired deadline.
pub(crate) fn spin_until(
    spin_time: Duration,
    deadline: &Deadline,
    mut attempt: impl FnMut() -> bool,
) -> bool {
    if attempt() {
        return true;
    }
    if spin_time.is_zero() {
        return false;
    }

    let start = Instant::now();
    let stop = match start.checked_add(spin_time) {
        Some(end) => deadline.cap(end),
        None => deadline.cap(start),
    };

    while Instant::now() < stop {
        std::hint::spin_loop();
        if attempt() {
            return true;
        }
    }
    false
}
