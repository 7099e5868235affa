/*!
 * Synchronization Configuration
 *
 * Runtime configuration for parking backend selection and spin budgets
 */

use crate::core::errors::ConfigError;
use crate::core::limits::{
    DEFAULT_SPIN_TIME, ENV_SPIN_NS, ENV_STRATEGY, LOW_LATENCY_SPIN_TIME, SINGLE_CPU_SPIN_TIME,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationNanoSeconds};
use std::str::FromStr;
use std::time::Duration;

/// Parking backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Raw futex syscall (Linux only, fastest)
    Futex,
    /// parking_lot_core address-keyed parking (portable)
    ParkingLot,
    /// Sharded mutex + condvar slots (portable, most conservative)
    Condvar,
    /// Auto-select based on platform
    Auto,
}

impl FromStr for StrategyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "futex" => Ok(StrategyType::Futex),
            "parking_lot" | "parkinglot" => Ok(StrategyType::ParkingLot),
            "condvar" => Ok(StrategyType::Condvar),
            "auto" => Ok(StrategyType::Auto),
            other => Err(ConfigError::InvalidStrategy(other.to_string())),
        }
    }
}

/// Synchronization configuration shared by every primitive
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Preferred parking backend
    pub strategy: StrategyType,
    /// How long a contended acquire spins before parking
    #[serde_as(as = "DurationNanoSeconds<u64>")]
    #[serde(rename = "spin_time_ns")]
    pub spin_time: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_time: DEFAULT_SPIN_TIME,
        }
    }
}

impl SyncConfig {
    /// Configuration optimized for very short critical sections
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_time: LOW_LATENCY_SPIN_TIME,
        }
    }

    /// Configuration for uniprocessor hosts: park immediately
    pub const fn single_cpu() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_time: SINGLE_CPU_SPIN_TIME,
        }
    }

    /// Pick `single_cpu` or the default based on available parallelism
    pub fn detect() -> Self {
        match std::thread::available_parallelism() {
            Ok(n) if n.get() == 1 => Self::single_cpu(),
            _ => Self::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyType) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_spin_time(mut self, spin_time: Duration) -> Self {
        self.spin_time = spin_time;
        self
    }

    /// Load overrides from the environment on top of `detect()`
    ///
    /// Environment variables:
    /// - YARN_SYNC_STRATEGY: futex | parking_lot | condvar | auto
    /// - YARN_SYNC_SPIN_NS: spin window in nanoseconds
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::detect();

        if let Ok(value) = std::env::var(ENV_STRATEGY) {
            config.strategy = value.parse()?;
        }

        if let Ok(value) = std::env::var(ENV_SPIN_NS) {
            let nanos = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSpinTime(value.clone()))?;
            config.spin_time = Duration::from_nanos(nanos);
        }

        Ok(config)
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Select best strategy for current platform
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            StrategyType::Auto | StrategyType::Futex => {
                // Prefer the raw futex on Linux, parking_lot elsewhere
                #[cfg(target_os = "linux")]
                {
                    StrategyType::Futex
                }
                #[cfg(not(target_os = "linux"))]
                {
                    StrategyType::ParkingLot
                }
            }
            other => other,
        }
    }
}
