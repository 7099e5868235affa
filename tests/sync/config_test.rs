/*!
 * Configuration Tests
 *
 * Environment overrides are process-global, so these run serially.
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::time::Duration;
use yarn_sync::{ConfigError, Lock, Semaphore, StrategyType, SyncConfig};

const STRATEGY_VAR: &str = "YARN_SYNC_STRATEGY";
const SPIN_VAR: &str = "YARN_SYNC_SPIN_NS";

fn clear_env() {
    std::env::remove_var(STRATEGY_VAR);
    std::env::remove_var(SPIN_VAR);
}

#[test]
#[serial]
fn test_from_env_without_overrides() {
    clear_env();
    assert_eq!(SyncConfig::from_env().unwrap(), SyncConfig::detect());
}

#[test]
#[serial]
fn test_from_env_reads_strategy_and_spin() {
    clear_env();
    std::env::set_var(STRATEGY_VAR, "Condvar");
    std::env::set_var(SPIN_VAR, " 2500 ");

    let config = SyncConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.strategy, StrategyType::Condvar);
    assert_eq!(config.spin_time, Duration::from_nanos(2500));
}

#[test]
#[serial]
fn test_from_env_rejects_unknown_strategy() {
    clear_env();
    std::env::set_var(STRATEGY_VAR, "spinlock");

    let err = SyncConfig::from_env().unwrap_err();
    clear_env();

    assert!(matches!(err, ConfigError::InvalidStrategy(ref name) if name == "spinlock"));
}

#[test]
#[serial]
fn test_from_env_rejects_bad_spin_time() {
    clear_env();
    std::env::set_var(SPIN_VAR, "-5");

    let err = SyncConfig::from_env().unwrap_err();
    clear_env();

    assert!(matches!(err, ConfigError::InvalidSpinTime(ref raw) if raw == "-5"));
}

#[test]
#[serial]
fn test_env_config_drives_primitives() {
    clear_env();
    std::env::set_var(STRATEGY_VAR, "parking_lot");
    std::env::set_var(SPIN_VAR, "0");

    let config = SyncConfig::from_env().unwrap();
    clear_env();

    let lock = Lock::with_config(&config);
    assert_eq!(lock.backend_name(), "parking_lot");
    assert_eq!(lock.spin_time(), Duration::ZERO);
    lock.lock();
    lock.unlock();

    let semaphore = Semaphore::with_config(1, &config);
    assert_eq!(semaphore.backend_name(), "parking_lot");
    semaphore.take();
    assert_eq!(semaphore.value(), 0);
}

#[test]
fn test_json_document_round_trips() {
    let config = SyncConfig::low_latency().with_strategy(StrategyType::Futex);
    let json = serde_json::to_string(&config).unwrap();

    assert!(json.contains("\"spin_time_ns\":50000"));
    assert_eq!(SyncConfig::from_json(&json).unwrap(), config);
}
