/*!
 * Synchronization Limits and Constants
 *
 * Centralized location for spin budgets, parking table sizes and wake-flag states.
 *
 * ## Conventions
 * - Performance-critical constants are marked with [PERF]
 * - Linux-compatible values are marked with [LINUX-COMPAT]
 */

use std::time::Duration;

// =============================================================================
// SPIN BUDGETS
// =============================================================================

/// Default spin window before a contended acquire parks (10µs)
/// [PERF] Covers short critical sections without burning a full quantum
pub const DEFAULT_SPIN_TIME: Duration = Duration::from_micros(10);

/// Spin window for latency-sensitive workloads (50µs)
pub const LOW_LATENCY_SPIN_TIME: Duration = Duration::from_micros(50);

/// Spin window on a single CPU: spinning only delays the lock holder
pub const SINGLE_CPU_SPIN_TIME: Duration = Duration::ZERO;

// =============================================================================
// PARKING
// =============================================================================

/// Condvar parking slot count per backend instance (16 slots)
/// [PERF] Must be power of 2; words hashing to the same slot share wakeups
pub const CONDVAR_PARKING_SLOTS: usize = 16;

/// Wake count meaning "every sleeper on the word"
/// [LINUX-COMPAT] FUTEX_WAKE takes a signed count, so i32::MAX wakes all
pub const WAKE_ALL: u32 = i32::MAX as u32;

// =============================================================================
// LOCK WORDS
// =============================================================================

/// Lock word value while free
pub const UNLOCKED: u32 = 0;

/// Lock word value while held
pub const LOCKED: u32 = 1;

// =============================================================================
// MONITOR WAKE FLAGS
// =============================================================================

/// Node is queued and has not been woken
pub const WAITING: u32 = 0;

/// Monitor ownership was handed to the node's thread
pub const GRANTED: u32 = 1;

/// Node was woken by `signal_all` and must re-acquire the monitor itself
pub const SIGNALLED: u32 = 2;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Parking backend override (futex | parking_lot | condvar | auto)
pub const ENV_STRATEGY: &str = "YARN_SYNC_STRATEGY";

/// Spin window override in nanoseconds
pub const ENV_SPIN_NS: &str = "YARN_SYNC_SPIN_NS";

/// Enables JSON tracing output when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "YARN_TRACE_JSON";
