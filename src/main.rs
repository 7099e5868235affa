/*!
 * yarn-stress - Contention Driver
 *
 * Runs each primitive under multi-threaded contention and logs throughput:
 * - Lock: shared counter increments
 * - Semaphore: bounded producer/consumer handoff
 * - Condition: ping-pong between two threads
 * - Monitor: turn-taking through predicates
 *
 * Environment variables:
 * - YARN_STRESS_THREADS: worker threads per scenario (default: available CPUs)
 * - YARN_STRESS_ITERATIONS: operations per worker (default: 100000)
 * - YARN_SYNC_STRATEGY / YARN_SYNC_SPIN_NS: see `SyncConfig::from_env`
 */

use miette::{ensure, miette, Result};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::info;
use yarn_sync::monitoring::ScenarioSpan;
use yarn_sync::{init_tracing, Condition, Lock, Monitor, Semaphore, SyncConfig};

const DEFAULT_ITERATIONS: u64 = 100_000;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| miette!("{} must be a positive integer, got {:?}", key, value)),
        Err(_) => Ok(default),
    }
}

/// Run one scenario inside its span and record the operations it reports
fn run_scenario(
    name: &'static str,
    threads: usize,
    scenario: impl FnOnce() -> Result<u64>,
) -> Result<()> {
    let mut span = ScenarioSpan::new(name, threads);
    let operations = {
        let _entered = span.enter();
        scenario()?
    };
    span.record_operations(operations);
    Ok(())
}

fn lock_counter(config: &SyncConfig, threads: usize, iterations: u64) -> Result<u64> {
    let lock = Arc::new(Lock::with_config(config));
    let counter = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let (lock, counter) = (lock.clone(), counter.clone());
            thread::spawn(move || {
                for _ in 0..iterations {
                    let _guard = lock.guard();
                    // Non-atomic read-modify-write; the lock is what keeps it exact
                    let value = counter.load(Ordering::Relaxed);
                    counter.store(value + 1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().map_err(|_| miette!("lock worker panicked"))?;
    }

    let expected = threads as u64 * iterations;
    let actual = counter.load(Ordering::Relaxed);
    ensure!(actual == expected, "lost updates: {} != {}", actual, expected);
    Ok(expected)
}

fn semaphore_handoff(config: &SyncConfig, threads: usize, iterations: u64) -> Result<u64> {
    let slots = Arc::new(Semaphore::with_config(threads as u32, config));
    let items = Arc::new(Semaphore::with_config(0, config));
    let consumed = Arc::new(AtomicU64::new(0));

    let mut handles = Vec::with_capacity(threads * 2);
    for _ in 0..threads {
        let (producer_slots, producer_items) = (slots.clone(), items.clone());
        handles.push(thread::spawn(move || {
            for _ in 0..iterations {
                producer_slots.take();
                producer_items.give();
            }
        }));

        let (consumer_slots, consumer_items, consumed) =
            (slots.clone(), items.clone(), consumed.clone());
        handles.push(thread::spawn(move || {
            for _ in 0..iterations {
                consumer_items.take();
                consumed.fetch_add(1, Ordering::Relaxed);
                consumer_slots.give();
            }
        }));
    }

    for handle in handles {
        handle.join().map_err(|_| miette!("semaphore worker panicked"))?;
    }

    let total = consumed.load(Ordering::Relaxed);
    ensure!(total == threads as u64 * iterations, "consumed {} items", total);
    ensure!(items.value() == 0, "items left over: {}", items.value());
    Ok(total)
}

fn condition_ping_pong(config: &SyncConfig, iterations: u64) -> Result<u64> {
    let lock = Arc::new(Lock::with_config(config));
    let cond = Arc::new(Condition::with_config(config));
    let turn = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..2u64)
        .map(|me| {
            let (lock, cond, turn) = (lock.clone(), cond.clone(), turn.clone());
            thread::spawn(move || {
                for _ in 0..iterations {
                    lock.lock();
                    cond.wait_while(&lock, || turn.load(Ordering::Relaxed) % 2 != me);
                    turn.fetch_add(1, Ordering::Relaxed);
                    cond.notify_all();
                    lock.unlock();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().map_err(|_| miette!("condition worker panicked"))?;
    }

    let total = turn.load(Ordering::Relaxed);
    ensure!(total == 2 * iterations, "took {} turns", total);
    Ok(total)
}

fn monitor_turns(config: &SyncConfig, threads: usize, iterations: u64) -> Result<u64> {
    let monitor = Arc::new(Monitor::with_config(config));
    let turn = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|me| {
            let (monitor, turn) = (monitor.clone(), turn.clone());
            thread::spawn(move || {
                for _ in 0..iterations {
                    let mut guard = monitor.lock();
                    guard.wait_for(|| turn.load(Ordering::Relaxed) % threads == me);
                    turn.fetch_add(1, Ordering::Relaxed);
                    guard.unlock();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().map_err(|_| miette!("monitor worker panicked"))?;
    }

    let total = turn.load(Ordering::Relaxed) as u64;
    ensure!(total == threads as u64 * iterations, "took {} turns", total);
    Ok(total)
}

fn main() -> Result<()> {
    init_tracing();

    let config = SyncConfig::from_env()?;
    let cpus = thread::available_parallelism().map_or(1, |n| n.get());
    let threads: usize = env_or("YARN_STRESS_THREADS", cpus)?;
    let iterations: u64 = env_or("YARN_STRESS_ITERATIONS", DEFAULT_ITERATIONS)?;
    ensure!(threads > 0, "YARN_STRESS_THREADS must be at least 1");

    info!(
        strategy = ?config.strategy,
        resolved = ?config.select_strategy(),
        spin_ns = config.spin_time.as_nanos() as u64,
        threads,
        iterations,
        "yarn-stress starting"
    );

    run_scenario("lock_counter", threads, || lock_counter(&config, threads, iterations))?;
    run_scenario("semaphore_handoff", threads * 2, || {
        semaphore_handoff(&config, threads, iterations)
    })?;
    run_scenario("condition_ping_pong", 2, || condition_ping_pong(&config, iterations))?;
    // Turn-taking is strictly serial; keep it short
    run_scenario("monitor_turns", threads, || {
        monitor_turns(&config, threads, (iterations / 10).max(1))
    })?;

    info!("all scenarios passed");
    Ok(())
}
