#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mentor_kernel_contracts::progression::{LearnerId, LearnerPhase};
use mentor_kernel_contracts::session::NEUTRAL_STATE;
use mentor_kernel_contracts::MonotonicTimeNs;
use mentor_storage::{SessionStore, StorageError, DEFAULT_LOCK_WAIT};

fn learner(id: &str) -> LearnerId {
    LearnerId::v1(id.to_string()).unwrap()
}

#[test]
fn at_store_db_01_parallel_same_learner_updates_apply_serially() {
    let store = SessionStore::new_in_memory();
    let id = learner("learner_hot");
    let threads = 8;
    let updates_per_thread = 25;
    let step = 0.002_f64;

    std::thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|| {
                for turn in 0..updates_per_thread {
                    store
                        .update(&id, MonotonicTimeNs(turn as u64), |session| {
                            session.state = (session.state + step).clamp(0.0, 1.0);
                        })
                        .unwrap();
                }
            });
        }
    });

    // 200 serialized applications of the same step; replay sequentially and
    // compare. Losing any update would leave the parallel state short.
    let mut expected = NEUTRAL_STATE;
    for _ in 0..threads * updates_per_thread {
        expected = (expected + step).clamp(0.0, 1.0);
    }
    let session = store.snapshot(&id).unwrap().unwrap();
    assert!((session.state - expected).abs() < 1e-12);
}

#[test]
fn at_store_db_02_distinct_learners_do_not_interfere() {
    let store = SessionStore::new_in_memory();
    let total = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for worker in 0..10 {
            let id = learner(&format!("learner_{worker}"));
            let store = &store;
            let total = &total;
            scope.spawn(move || {
                for turn in 0..50 {
                    store
                        .update(&id, MonotonicTimeNs(turn), |session| {
                            session.state = (session.state + 0.001).clamp(0.0, 1.0);
                            session.phase = LearnerPhase::Practice;
                        })
                        .unwrap();
                    total.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    assert_eq!(total.load(Ordering::Relaxed), 500);
    assert_eq!(store.len(), 10);
    for worker in 0..10 {
        let session = store
            .snapshot(&learner(&format!("learner_{worker}")))
            .unwrap()
            .unwrap();
        assert!((session.state - 0.55).abs() < 1e-12);
        assert_eq!(session.phase, LearnerPhase::Practice);
    }
}

#[test]
fn at_store_db_03_bounded_wait_reports_contention() {
    let store = SessionStore::with_shards(1, Duration::from_millis(10));
    let holder = learner("learner_holder");
    let waiter = learner("learner_waiter");

    std::thread::scope(|scope| {
        let store = &store;
        let held = scope.spawn(move || {
            store
                .update(&holder, MonotonicTimeNs(1), |_session| {
                    std::thread::sleep(Duration::from_millis(150));
                })
                .unwrap();
        });

        // Give the holder time to take the only shard, then exhaust the
        // waiter's budget against it.
        std::thread::sleep(Duration::from_millis(30));
        let result = store.update(&waiter, MonotonicTimeNs(2), |_session| {});
        match result {
            Err(StorageError::LockContention { waited_ns }) => {
                assert!(waited_ns >= 10_000_000);
            }
            other => panic!("expected LockContention, got {other:?}"),
        }
        held.join().unwrap();
    });

    // The failed call must not have touched the store: only the holder's
    // session exists.
    assert_eq!(store.len(), 1);
    assert!(store.snapshot(&learner("learner_waiter")).unwrap().is_none());
}

#[test]
fn at_store_db_04_contended_call_retries_cleanly() {
    let store = SessionStore::with_shards(1, DEFAULT_LOCK_WAIT);
    let id = learner("learner_retry");
    store
        .update(&id, MonotonicTimeNs(1), |session| session.state = 0.6)
        .unwrap();
    // A retry after contention sees the prior update intact.
    let (session, _) = store.update(&id, MonotonicTimeNs(2), |_s| ()).unwrap();
    assert_eq!(session.state, 0.6);
    assert_eq!(session.last_updated, MonotonicTimeNs(2));
}
