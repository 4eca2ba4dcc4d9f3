//! End-to-end scenarios exercising `Client` and `LockManager` together,
//! covering the reentrancy, upgrade/downgrade, deadlock, timeout, and
//! stop paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use graphlock::lock::config::{LockManagerConfig, ResolutionStrategyKind};
use graphlock::lock::manager::LockManager;
use graphlock::lock::wait_strategy::{ConstantSleep, WaitStrategy};
use graphlock::NoOpTracer;

const NODE: usize = 0;

fn fast_manager(resource_type_count: usize, timeout_millis: u64) -> LockManager {
    let config = LockManagerConfig {
        resource_type_count,
        max_clients: 64,
        lock_acquisition_timeout_millis: timeout_millis,
        deadlock_resolution_strategy: ResolutionStrategyKind::AbortYounger,
    };
    let strategies: Vec<Box<dyn WaitStrategy>> = (0..resource_type_count)
        .map(|_| Box::new(ConstantSleep(Duration::from_millis(1))) as Box<dyn WaitStrategy>)
        .collect();
    LockManager::new(config, strategies)
}

#[test]
fn reentrant_shared_lock_requires_matching_releases() {
    let manager = fast_manager(1, 1_000);
    let client = manager.new_client();
    let tracer = NoOpTracer;

    client.acquire_shared(&tracer, NODE, &[1]).unwrap();
    client.acquire_shared(&tracer, NODE, &[1]).unwrap();
    client.acquire_shared(&tracer, NODE, &[1]).unwrap();

    client.release_shared(NODE, 1).unwrap();
    client.release_shared(NODE, 1).unwrap();
    // still held once
    assert_eq!(client.active_locks().len(), 1);
    client.release_shared(NODE, 1).unwrap();
    assert!(client.active_locks().is_empty());

    // one release too many is an error, not a panic
    assert!(client.release_shared(NODE, 1).is_err());
    client.close();
}

#[test]
fn shared_lock_allows_multiple_concurrent_holders() {
    let manager = fast_manager(1, 1_000);
    let a = manager.new_client();
    let b = manager.new_client();
    let tracer = NoOpTracer;

    a.acquire_shared(&tracer, NODE, &[10]).unwrap();
    b.acquire_shared(&tracer, NODE, &[10]).unwrap();

    assert_eq!(a.active_locks().len(), 1);
    assert_eq!(b.active_locks().len(), 1);

    a.close();
    b.close();
}

#[test]
fn exclusive_lock_excludes_other_clients() {
    let manager = Arc::new(fast_manager(1, 5_000));
    let a = manager.new_client();
    let b = manager.new_client();
    let tracer = NoOpTracer;

    a.acquire_exclusive(&tracer, NODE, &[99]).unwrap();
    assert!(!b.try_exclusive(NODE, 99).unwrap());
    assert!(!b.try_shared(NODE, 99).unwrap());

    a.release_exclusive(NODE, 99).unwrap();
    assert!(b.try_exclusive(NODE, 99).unwrap());

    a.close();
    b.close();
}

#[test]
fn release_exclusive_downgrades_in_place_when_a_shared_count_remains() {
    // C1 holds shared first (arms the downgrade), then upgrades to
    // exclusive, then releases the exclusive hold. It should end up back
    // to holding only a shared lock, automatically, letting another
    // client take a concurrent shared hold.
    let manager = fast_manager(1, 5_000);
    let a = manager.new_client();
    let b = manager.new_client();
    let tracer = NoOpTracer;

    a.acquire_shared(&tracer, NODE, &[5]).unwrap();
    a.acquire_exclusive(&tracer, NODE, &[5]).unwrap();
    a.release_exclusive(NODE, 5).unwrap();

    assert_eq!(a.active_locks().len(), 1);
    assert!(b.try_shared(NODE, 5).unwrap());
    assert!(!b.try_exclusive(NODE, 5).unwrap());

    a.release_shared(NODE, 5).unwrap();
    a.close();
    b.close();
}

#[test]
fn release_exclusive_downgrades_by_replacing_the_slot_when_acquired_exclusive_first() {
    // Here C1 acquires exclusive with no prior shared hold, then arms the
    // downgrade by calling acquire_shared on the same id afterward. The
    // table slot is still C1's own ExclusiveLock (no upgrade protocol was
    // ever involved), so the downgrade has to replace the slot rather
    // than just release a reservation.
    let manager = fast_manager(1, 1_000);
    let a = manager.new_client();
    let b = manager.new_client();
    let tracer = NoOpTracer;

    a.acquire_exclusive(&tracer, NODE, &[6]).unwrap();
    a.acquire_shared(&tracer, NODE, &[6]).unwrap();
    a.release_exclusive(NODE, 6).unwrap();

    assert_eq!(a.active_locks().len(), 1);
    assert!(b.try_shared(NODE, 6).unwrap());
    assert!(!b.try_exclusive(NODE, 6).unwrap());

    a.release_shared(NODE, 6).unwrap();
    a.close();
    b.close();
}

#[test]
fn release_exclusive_does_not_leak_the_slot_when_the_shared_count_is_released_first() {
    // C1 upgrades shared to exclusive in place, then releases its shared
    // count before its exclusive count (a valid, balanced call
    // sequence). By the time release_exclusive runs, shared_counts no
    // longer contains the id, but the table slot is still the original
    // SharedLock with C1 as its update-lock holder; release_exclusive
    // must still find and clean that up.
    let manager = fast_manager(1, 5_000);
    let a = manager.new_client();
    let b = manager.new_client();
    let tracer = NoOpTracer;

    a.acquire_shared(&tracer, NODE, &[8]).unwrap();
    a.acquire_exclusive(&tracer, NODE, &[8]).unwrap();
    a.release_shared(NODE, 8).unwrap();
    a.release_exclusive(NODE, 8).unwrap();

    assert!(a.active_locks().is_empty());
    assert!(b.try_exclusive(NODE, 8).unwrap());

    a.close();
    b.close();
}

#[test]
fn upgrade_waits_for_other_shared_holders_to_drain() {
    let manager = Arc::new(fast_manager(1, 5_000));
    let a = manager.new_client();
    let b = manager.new_client();
    let tracer = NoOpTracer;

    a.acquire_shared(&tracer, NODE, &[7]).unwrap();
    b.acquire_shared(&tracer, NODE, &[7]).unwrap();

    let upgrading = manager.new_client();
    upgrading.acquire_shared(&tracer, NODE, &[7]).unwrap();

    let handle = {
        let upgrading = upgrading.clone();
        thread::spawn(move || {
            let tracer = NoOpTracer;
            upgrading.acquire_exclusive(&tracer, NODE, &[7]).unwrap();
        })
    };

    thread::sleep(Duration::from_millis(20));
    a.release_shared(NODE, 7).unwrap();
    thread::sleep(Duration::from_millis(20));
    b.release_shared(NODE, 7).unwrap();

    handle.join().unwrap();
    assert_eq!(upgrading.active_locks().len(), 1);

    a.close();
    b.close();
    upgrading.close();
}

#[test]
fn two_clients_waiting_on_each_other_resolve_a_deadlock() {
    let manager = Arc::new(fast_manager(1, 10_000));
    let a = manager.new_client();
    let b = manager.new_client();

    a.acquire_exclusive(&NoOpTracer, NODE, &[1]).unwrap();
    b.acquire_exclusive(&NoOpTracer, NODE, &[2]).unwrap();

    let a_failed = Arc::new(AtomicBool::new(false));
    let b_failed = Arc::new(AtomicBool::new(false));

    // Whichever side is picked as the deadlock victim releases its own
    // held resource, the way a real transaction abort would, so the
    // survivor is guaranteed to make progress instead of the test itself
    // deadlocking on `join`.
    let handle_a = {
        let a = a.clone();
        let a_failed = a_failed.clone();
        thread::spawn(move || {
            if a.acquire_exclusive(&NoOpTracer, NODE, &[2]).is_err() {
                a_failed.store(true, Ordering::SeqCst);
                a.release_exclusive(NODE, 1).unwrap();
            }
        })
    };
    let handle_b = {
        let b = b.clone();
        let b_failed = b_failed.clone();
        thread::spawn(move || {
            if b.acquire_exclusive(&NoOpTracer, NODE, &[1]).is_err() {
                b_failed.store(true, Ordering::SeqCst);
                b.release_exclusive(NODE, 2).unwrap();
            }
        })
    };

    handle_a.join().unwrap();
    handle_b.join().unwrap();

    // exactly one side should have been sacrificed to break the cycle
    assert_ne!(a_failed.load(Ordering::SeqCst), b_failed.load(Ordering::SeqCst));
    let (deadlocks_detected, _) = manager.deadlock_stats();
    assert!(deadlocks_detected >= 1);

    a.close();
    b.close();
}

#[test]
fn acquire_times_out_against_an_uncooperative_holder() {
    let manager = fast_manager(1, 50);
    let a = manager.new_client();
    let b = manager.new_client();

    a.acquire_exclusive(&NoOpTracer, NODE, &[3]).unwrap();
    let err = b.acquire_exclusive(&NoOpTracer, NODE, &[3]).unwrap_err();
    assert!(err.is_retriable());

    a.close();
    b.close();
}

#[test]
fn concurrent_random_interleaving_never_panics_or_double_frees_a_lock() {
    use rand::Rng;

    let manager = Arc::new(fast_manager(2, 2_000));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                let client = manager.new_client();
                let tracer = NoOpTracer;
                let mut rng = rand::rng();
                for _ in 0..50 {
                    let resource_type = rng.random_range(0..2);
                    let resource_id = rng.random_range(0..4);
                    let exclusive = rng.random_bool(0.3);
                    let acquired = if exclusive {
                        client.acquire_exclusive(&tracer, resource_type, &[resource_id])
                    } else {
                        client.acquire_shared(&tracer, resource_type, &[resource_id])
                    };
                    if acquired.is_ok() {
                        let _ = if exclusive {
                            client.release_exclusive(resource_type, resource_id)
                        } else {
                            client.release_shared(resource_type, resource_id)
                        };
                    }
                }
                client.close();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn stop_unblocks_a_client_waiting_forever() {
    let manager = Arc::new(fast_manager(1, 0));
    let a = manager.new_client();
    let b = manager.new_client();

    a.acquire_exclusive(&NoOpTracer, NODE, &[4]).unwrap();

    let handle = {
        let b = b.clone();
        thread::spawn(move || b.acquire_exclusive(&NoOpTracer, NODE, &[4]))
    };

    thread::sleep(Duration::from_millis(20));
    b.stop();
    let result = handle.join().unwrap();
    assert!(result.is_err());

    a.close();
    b.close();
}
