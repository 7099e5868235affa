/*!
 * Error Types
 * Timeout and configuration errors with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for timed synchronization operations
pub type SyncResult<T> = Result<T, TimeoutExpired>;

/// Operation that gave up waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimedOperation {
    /// `Lock::lock_timeout`
    Lock,
    /// `Semaphore::take_timeout`
    Take,
    /// `Monitor::lock_timeout`
    MonitorEnter,
}

impl fmt::Display for TimedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimedOperation::Lock => "lock acquisition",
            TimedOperation::Take => "semaphore take",
            TimedOperation::MonitorEnter => "monitor entry",
        };
        f.write_str(name)
    }
}

/// Deadline elapsed before a timed acquire succeeded
///
/// The failing thread holds nothing it tried to acquire by the time this is returned.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[error("{operation} timed out after {timeout:?}")]
#[diagnostic(
    code(sync::timeout_expired),
    help("The primitive stayed unavailable for the whole timeout. Check for a holder that never releases.")
)]
pub struct TimeoutExpired {
    pub operation: TimedOperation,
    pub timeout: Duration,
}

impl TimeoutExpired {
    pub const fn lock(timeout: Duration) -> Self {
        Self {
            operation: TimedOperation::Lock,
            timeout,
        }
    }

    pub const fn take(timeout: Duration) -> Self {
        Self {
            operation: TimedOperation::Take,
            timeout,
        }
    }

    pub const fn monitor(timeout: Duration) -> Self {
        Self {
            operation: TimedOperation::MonitorEnter,
            timeout,
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Unknown parking strategy: {0}")]
    #[diagnostic(
        code(config::invalid_strategy),
        help("Use one of: futex, parking_lot, condvar, auto.")
    )]
    InvalidStrategy(String),

    #[error("Invalid spin time: {0}")]
    #[diagnostic(
        code(config::invalid_spin_time),
        help("Spin time is a whole number of nanoseconds.")
    )]
    InvalidSpinTime(String),

    #[error("Malformed configuration: {0}")]
    #[diagnostic(code(config::malformed))]
    Malformed(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed(err.to_string())
    }
}
