/*!
 * Synchronization Primitives
 *
 * Spin-then-park primitives built on a futex-like wait/wake capability:
 * - `Lock`: mutual exclusion with tunable spin time and timed acquisition
 * - `Semaphore`: unbounded counting semaphore
 * - `Condition`: wait/notify paired with a `Lock`
 * - `Monitor`: lock plus FIFO-fair, predicate-gated waiting
 *
 * # Architecture
 *
 * Every primitive is generic over a `ParkedWait` backend and defaults to the
 * enum-dispatched `Parker`, selected at runtime from `SyncConfig`.
 *
 * # Ordering
 *
 * Lock, Semaphore and Condition make no promise about which waiter wins.
 * Monitor serves satisfied waiters strictly in arrival order.
 */

mod condition;
mod config;
mod deadline;
mod lock;
mod monitor;
mod semaphore;

pub mod park;

pub use condition::Condition;
pub use config::{StrategyType, SyncConfig};
pub use lock::{Lock, LockGuard};
pub use monitor::{Monitor, MonitorGuard};
pub use park::{ParkResult, ParkedWait, Parker, WakeResult};
pub use semaphore::Semaphore;
