/*!
 * Parked Wait
 *
 * Futex-like "sleep while word == expected" / "wake N sleepers on word":
 * - Futex-based (Linux, fastest)
 * - parking_lot_core-based (portable futex emulation)
 * - Condvar-based (portable, sharded slots)
 */

mod condvar;
#[cfg(target_os = "linux")]
mod futex;
mod parker;
mod parking;
mod traits;

// Re-export public API
pub use parker::Parker;
pub use traits::{ParkResult, ParkedWait, WakeResult};

// Re-export specific backends for advanced users
pub use condvar::CondvarWait;
#[cfg(target_os = "linux")]
pub use futex::FutexWait;
pub use parking::ParkingLotWait;
