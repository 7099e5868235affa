/*!
 * parking_lot_core Parking Backend
 *
 * Portable futex emulation: threads park in parking_lot's global hash table
 * keyed by the word's address. The validate callback re-reads the word while
 * the bucket lock is held, which gives the same check-then-sleep atomicity
 * as the kernel futex.
 */

use super::traits::{ParkResult, ParkedWait, WakeResult};
use parking_lot_core::{
    park, unpark_filter, FilterOp, ParkResult as CoreParkResult, DEFAULT_PARK_TOKEN,
    DEFAULT_UNPARK_TOKEN,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Address-keyed parking through parking_lot_core
#[derive(Debug, Default, Clone, Copy)]
pub struct ParkingLotWait;

impl ParkingLotWait {
    pub const fn new() -> Self {
        Self
    }
}

#[inline]
fn key(word: &AtomicU32) -> usize {
    word as *const AtomicU32 as usize
}

impl ParkedWait for ParkingLotWait {
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> ParkResult {
        // A timeout too large to represent is treated as no timeout
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        // SAFETY: the callbacks neither panic nor call back into parking_lot.
        let result = unsafe {
            park(
                key(word),
                || word.load(Ordering::SeqCst) == expected,
                || {},
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                deadline,
            )
        };

        match result {
            CoreParkResult::Unparked(_) => ParkResult::Woken,
            CoreParkResult::Invalid => ParkResult::Mismatch,
            CoreParkResult::TimedOut => ParkResult::TimedOut,
        }
    }

    fn wake(&self, word: &AtomicU32, count: u32) -> WakeResult {
        let mut remaining = count;

        // SAFETY: the filter and callback neither panic nor call back into parking_lot.
        let result = unsafe {
            unpark_filter(
                key(word),
                |_| {
                    if remaining == 0 {
                        FilterOp::Stop
                    } else {
                        remaining -= 1;
                        FilterOp::Unpark
                    }
                },
                |_| DEFAULT_UNPARK_TOKEN,
            )
        };

        WakeResult::from_count(result.unparked_threads)
    }

    fn name(&self) -> &'static str {
        "parking_lot"
    }
}
