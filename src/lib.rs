/*!
 * yarn-sync
 *
 * User-space synchronization primitives on a futex-like wait/wake facility:
 * a spin-then-park `Lock`, a counting `Semaphore`, a `Condition` variable and
 * a FIFO-fair, predicate-driven `Monitor`.
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{ConfigError, SyncResult, TimedOperation, TimeoutExpired};
pub use crate::core::sync::{
    Condition, Lock, LockGuard, Monitor, MonitorGuard, ParkResult, ParkedWait, Parker, Semaphore,
    StrategyType, SyncConfig, WakeResult,
};
pub use monitoring::init_tracing;
