/*!
 * Parker
 *
 * Default parking backend: enum dispatch over the built-in strategies.
 *
 * # Design: Enum Dispatch for Zero-Cost Abstraction
 *
 * Primitives default to `Parker` rather than `Box<dyn ParkedWait>`, so the
 * backend is chosen at runtime from `SyncConfig` while calls stay direct.
 */

use super::condvar::CondvarWait;
#[cfg(target_os = "linux")]
use super::futex::FutexWait;
use super::parking::ParkingLotWait;
use super::traits::{ParkResult, ParkedWait, WakeResult};
use crate::core::sync::config::{StrategyType, SyncConfig};
use std::sync::atomic::AtomicU32;
use std::time::Duration;
use tracing::debug;

/// Runtime-selected parking backend
#[derive(Debug)]
pub enum Parker {
    #[cfg(target_os = "linux")]
    Futex(FutexWait),
    ParkingLot(ParkingLotWait),
    Condvar(CondvarWait),
}

impl Parker {
    /// Build the backend a strategy resolves to on this platform
    pub fn new(strategy: StrategyType) -> Self {
        Self::from_config(&SyncConfig::default().with_strategy(strategy))
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        let parker = match config.select_strategy() {
            #[cfg(target_os = "linux")]
            StrategyType::Futex => Parker::Futex(FutexWait::new()),
            StrategyType::Condvar => Parker::Condvar(CondvarWait::new()),
            _ => Parker::ParkingLot(ParkingLotWait::new()),
        };
        debug!(strategy = ?config.strategy, backend = parker.name(), "parking backend selected");
        parker
    }
}

impl Default for Parker {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl ParkedWait for Parker {
    #[inline(always)]
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> ParkResult {
        match self {
            #[cfg(target_os = "linux")]
            Self::Futex(p) => p.wait(word, expected, timeout),
            Self::ParkingLot(p) => p.wait(word, expected, timeout),
            Self::Condvar(p) => p.wait(word, expected, timeout),
        }
    }

    #[inline(always)]
    fn wake(&self, word: &AtomicU32, count: u32) -> WakeResult {
        match self {
            #[cfg(target_os = "linux")]
            Self::Futex(p) => p.wake(word, count),
            Self::ParkingLot(p) => p.wake(word, count),
            Self::Condvar(p) => p.wake(word, count),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            #[cfg(target_os = "linux")]
            Self::Futex(p) => p.name(),
            Self::ParkingLot(p) => p.name(),
            Self::Condvar(p) => p.name(),
        }
    }
}
