/*!
 * Semaphore Tests
 */

use crate::common::{config, parking_config, STRATEGIES};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use yarn_sync::{Semaphore, StrategyType, TimedOperation};

#[derive(Debug, Clone, Copy)]
enum Op {
    Give,
    GiveMany(u32),
    TryTake,
    TryTakeMany(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Give),
        (0u32..4).prop_map(Op::GiveMany),
        Just(Op::TryTake),
        (0u32..5).prop_map(Op::TryTakeMany),
    ]
}

proptest! {
    #[test]
    fn prop_sequential_conservation(initial in 0u32..4, ops in prop::collection::vec(op_strategy(), 0..64)) {
        let sem = Semaphore::new(initial);
        let mut given = initial as u64;
        let mut taken = 0u64;

        for op in ops {
            match op {
                Op::Give => {
                    sem.give();
                    given += 1;
                }
                Op::GiveMany(n) => {
                    sem.give_many(n);
                    given += n as u64;
                }
                Op::TryTake => {
                    let before = sem.value();
                    if sem.try_take() {
                        taken += 1;
                    } else {
                        prop_assert_eq!(before, 0);
                        prop_assert_eq!(sem.value(), 0);
                    }
                }
                Op::TryTakeMany(n) => {
                    let before = sem.value();
                    if sem.try_take_many(n) {
                        prop_assert!(before >= n);
                        taken += n as u64;
                    } else {
                        prop_assert!(before < n);
                        prop_assert_eq!(sem.value(), before);
                    }
                }
            }
            prop_assert!(taken <= given);
            prop_assert_eq!(sem.value() as u64, given - taken);
        }
    }
}

#[test]
fn test_try_take_on_zero_never_decrements() {
    let sem = Semaphore::new(0);
    for _ in 0..100 {
        assert!(!sem.try_take());
    }
    assert_eq!(sem.value(), 0);
}

#[test]
fn test_concurrent_conservation() {
    for strategy in STRATEGIES {
        let sem = Arc::new(Semaphore::with_config(2, &config(strategy)));
        let taken = Arc::new(AtomicU64::new(0));
        let given = Arc::new(AtomicU64::new(2));
        let start = Arc::new(Barrier::new(8));

        let mut handles = Vec::new();
        for worker in 0..8 {
            let (sem, taken, given, start) =
                (sem.clone(), taken.clone(), given.clone(), start.clone());
            handles.push(thread::spawn(move || {
                start.wait();
                for _ in 0..2_000 {
                    if worker % 2 == 0 {
                        given.fetch_add(1, Ordering::SeqCst);
                        sem.give();
                    } else if sem.try_take() {
                        let taken_now = taken.fetch_add(1, Ordering::SeqCst) + 1;
                        assert!(taken_now <= given.load(Ordering::SeqCst));
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let (taken, given) = (taken.load(Ordering::SeqCst), given.load(Ordering::SeqCst));
        assert!(taken <= given, "{strategy:?}");
        assert_eq!(sem.value() as u64, given - taken, "{strategy:?}");
    }
}

#[test]
fn test_blocking_take_completes_with_gives() {
    for strategy in STRATEGIES {
        let sem = Arc::new(Semaphore::with_config(0, &parking_config(strategy)));
        let completed = Arc::new(AtomicU64::new(0));

        let takers: Vec<_> = (0..4)
            .map(|_| {
                let (sem, completed) = (sem.clone(), completed.clone());
                thread::spawn(move || {
                    for _ in 0..250 {
                        sem.take();
                        completed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for _ in 0..1_000 {
            sem.give();
            assert!(completed.load(Ordering::SeqCst) <= 1_000);
        }

        for taker in takers {
            taker.join().unwrap();
        }
        assert_eq!(completed.load(Ordering::SeqCst), 1_000, "{strategy:?}");
        assert_eq!(sem.value(), 0, "{strategy:?}");
    }
}

#[test]
fn test_take_timeout_lower_bound() {
    for strategy in STRATEGIES {
        let sem = Semaphore::with_config(0, &config(strategy));
        for timeout in [
            Duration::ZERO,
            Duration::from_micros(10),
            Duration::from_millis(1),
        ] {
            let start = Instant::now();
            let err = sem.take_timeout(timeout).unwrap_err();
            assert_eq!(err.operation, TimedOperation::Take);
            assert!(start.elapsed() >= timeout, "{strategy:?}");
        }
        assert_eq!(sem.value(), 0);
    }
}

#[test]
fn test_take_timeout_succeeds_when_given_in_time() {
    let sem = Arc::new(Semaphore::with_config(0, &parking_config(StrategyType::Auto)));

    let giver = {
        let sem = sem.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            sem.give();
        })
    };

    assert!(sem.take_timeout(Duration::from_secs(2)).is_ok());
    giver.join().unwrap();
    assert_eq!(sem.value(), 0);
}

#[test]
fn test_give_many_wakes_each_taker() {
    for strategy in STRATEGIES {
        let sem = Arc::new(Semaphore::with_config(0, &parking_config(strategy)));

        let takers: Vec<_> = (0..5)
            .map(|_| {
                let sem = sem.clone();
                thread::spawn(move || sem.take_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        sem.give_many(5);

        for taker in takers {
            assert!(taker.join().unwrap().is_ok(), "{strategy:?}");
        }
        assert_eq!(sem.value(), 0);
    }
}

#[test]
fn test_take_many_alongside_single_takers() {
    for strategy in STRATEGIES {
        let sem = Arc::new(Semaphore::with_config(0, &parking_config(strategy)));
        let completed = Arc::new(AtomicU64::new(0));

        let bulk = {
            let (sem, completed) = (sem.clone(), completed.clone());
            thread::spawn(move || {
                for _ in 0..50 {
                    sem.take_many(4);
                    completed.fetch_add(4, Ordering::SeqCst);
                }
            })
        };
        let singles: Vec<_> = (0..2)
            .map(|_| {
                let (sem, completed) = (sem.clone(), completed.clone());
                thread::spawn(move || {
                    for _ in 0..100 {
                        sem.take();
                        completed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        // 200 units for the bulk taker, 200 for the single takers
        for round in 0..400 {
            if round % 3 == 0 {
                thread::yield_now();
            }
            sem.give();
        }

        bulk.join().unwrap();
        for single in singles {
            single.join().unwrap();
        }
        assert_eq!(completed.load(Ordering::SeqCst), 400, "{strategy:?}");
        assert_eq!(sem.value(), 0, "{strategy:?}");
    }
}

#[test]
fn test_take_many_timeout_lower_bound() {
    for strategy in STRATEGIES {
        let sem = Semaphore::with_config(3, &config(strategy));
        for timeout in [Duration::ZERO, Duration::from_millis(1)] {
            let start = Instant::now();
            let err = sem.take_many_timeout(4, timeout).unwrap_err();
            assert_eq!(err.operation, TimedOperation::Take);
            assert!(start.elapsed() >= timeout, "{strategy:?}");
        }
        assert_eq!(sem.value(), 3, "{strategy:?}");
    }
}
