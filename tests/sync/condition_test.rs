/*!
 * Condition Tests
 */

use crate::common::{config, parking_config, wait_until, STRATEGIES};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use yarn_sync::{Condition, Lock};

/// Queue guarded by a yarn Lock; only touched while the lock is held
struct Shared {
    lock: Lock,
    not_empty: Condition,
    items: parking_lot::Mutex<VecDeque<u64>>,
}

#[test]
fn test_producer_consumer() {
    for strategy in STRATEGIES {
        let shared = Arc::new(Shared {
            lock: Lock::with_config(&config(strategy)),
            not_empty: Condition::with_config(&config(strategy)),
            items: parking_lot::Mutex::new(VecDeque::new()),
        });

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut sum = 0u64;
                    for _ in 0..100 {
                        shared.lock.lock();
                        shared
                            .not_empty
                            .wait_while(&shared.lock, || shared.items.lock().is_empty());
                        sum += shared.items.lock().pop_front().unwrap();
                        shared.lock.unlock();
                    }
                    sum
                })
            })
            .collect();

        for value in 1..=300u64 {
            shared.lock.lock();
            shared.items.lock().push_back(value);
            shared.not_empty.notify();
            shared.lock.unlock();
        }

        let total: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();
        assert_eq!(total, (1..=300u64).sum::<u64>(), "{strategy:?}");
    }
}

#[test]
fn test_notify_all_wakes_every_waiter() {
    for strategy in STRATEGIES {
        let lock = Arc::new(Lock::with_config(&parking_config(strategy)));
        let cond = Arc::new(Condition::with_config(&parking_config(strategy)));
        let go = Arc::new(AtomicBool::new(false));
        let entered = Arc::new(AtomicUsize::new(0));
        let woken = Arc::new(AtomicUsize::new(0));

        let waiters: Vec<_> = (0..5)
            .map(|_| {
                let (lock, cond, go, entered, woken) =
                    (lock.clone(), cond.clone(), go.clone(), entered.clone(), woken.clone());
                thread::spawn(move || {
                    lock.lock();
                    entered.fetch_add(1, Ordering::SeqCst);
                    cond.wait_while(&lock, || !go.load(Ordering::SeqCst));
                    woken.fetch_add(1, Ordering::SeqCst);
                    lock.unlock();
                })
            })
            .collect();

        wait_until(Duration::from_secs(5), || entered.load(Ordering::SeqCst) == 5);

        lock.lock();
        go.store(true, Ordering::SeqCst);
        cond.notify_all();
        lock.unlock();

        for waiter in waiters {
            waiter.join().unwrap();
        }
        assert_eq!(woken.load(Ordering::SeqCst), 5, "{strategy:?}");
    }
}

#[test]
fn test_notify_before_park_is_not_lost() {
    // The notifier runs immediately after the waiter releases the lock, often
    // before the waiter reaches the park call
    for strategy in STRATEGIES {
        let lock = Arc::new(Lock::with_config(&config(strategy)));
        let cond = Arc::new(Condition::with_config(&config(strategy)));
        let flag = Arc::new(AtomicBool::new(false));

        for _ in 0..200 {
            flag.store(false, Ordering::SeqCst);
            lock.lock();

            let notifier = {
                let (lock, cond, flag) = (lock.clone(), cond.clone(), flag.clone());
                thread::spawn(move || {
                    lock.lock();
                    flag.store(true, Ordering::SeqCst);
                    cond.notify();
                    lock.unlock();
                })
            };

            cond.wait_while(&lock, || !flag.load(Ordering::SeqCst));
            lock.unlock();
            notifier.join().unwrap();
        }
    }
}
