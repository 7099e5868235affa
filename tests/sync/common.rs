/*!
 * Shared helpers for synchronization tests
 */

use std::time::{Duration, Instant};
use yarn_sync::{StrategyType, SyncConfig};

/// Every concrete parking backend
pub const STRATEGIES: [StrategyType; 3] = [
    StrategyType::Futex,
    StrategyType::ParkingLot,
    StrategyType::Condvar,
];

/// Default spin time on the given backend
pub fn config(strategy: StrategyType) -> SyncConfig {
    SyncConfig::default().with_strategy(strategy)
}

/// No spinning: every contended acquire goes straight to the park path
pub fn parking_config(strategy: StrategyType) -> SyncConfig {
    SyncConfig::single_cpu().with_strategy(strategy)
}

/// Poll `condition` until it holds, failing the test after `timeout`
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        assert!(start.elapsed() < timeout, "condition not reached within {timeout:?}");
        std::thread::sleep(Duration::from_millis(1));
    }
}
