/*!
 * Futex Parking Backend (Linux)
 *
 * Direct `FUTEX_WAIT_PRIVATE` / `FUTEX_WAKE_PRIVATE` syscalls on the word itself.
 * The kernel performs the `word == expected` check under its own hash-bucket
 * lock, which is what makes store-then-wake race free.
 */

use super::traits::{ParkResult, ParkedWait, WakeResult};
use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Raw futex backend
///
/// Stateless: the kernel keys its wait queues by the word's address.
#[derive(Debug, Default, Clone, Copy)]
pub struct FutexWait;

impl FutexWait {
    pub const fn new() -> Self {
        Self
    }
}

fn to_timespec(timeout: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_nsec: timeout.subsec_nanos() as libc::c_long,
    }
}

impl ParkedWait for FutexWait {
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> ParkResult {
        let timespec = timeout.map(to_timespec);
        let timespec_ptr = timespec
            .as_ref()
            .map_or(std::ptr::null(), |ts| ts as *const libc::timespec);

        // SAFETY: `word` is a live AtomicU32 for the duration of the call and the
        // timespec (if any) outlives the syscall. FUTEX_WAIT only reads the word.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_futex,
                word as *const AtomicU32 as *const u32,
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                expected,
                timespec_ptr,
            )
        };

        if rc == 0 {
            return ParkResult::Woken;
        }

        match std::io::Error::last_os_error().raw_os_error() {
            Some(libc::EAGAIN) => ParkResult::Mismatch,
            Some(libc::ETIMEDOUT) => ParkResult::TimedOut,
            // EINTR and anything unexpected: report a spurious wake, callers re-check
            _ => ParkResult::Woken,
        }
    }

    fn wake(&self, word: &AtomicU32, count: u32) -> WakeResult {
        let count = count.min(i32::MAX as u32) as libc::c_int;

        // SAFETY: FUTEX_WAKE never dereferences the word; the address is only a key.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_futex,
                word as *const AtomicU32 as *const u32,
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                count,
            )
        };

        WakeResult::from_count(rc.max(0) as usize)
    }

    fn name(&self) -> &'static str {
        "futex"
    }
}
