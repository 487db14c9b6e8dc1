use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use quota_gate::quota::{QuotaEngine, UseOutcome};
use quota_gate::registry::RegistrationOutcome;
use quota_gate::types::ids::ApiKey;
use quota_gate::types::timestamp::Timestamp;

fn admitted_count(outcomes: &[UseOutcome]) -> usize {
    outcomes.iter().filter(|o| o.is_admitted()).count()
}

#[test]
fn same_key_threads_admit_exactly_limit() {
    let engine = Arc::new(QuotaEngine::new());
    let key = ApiKey::new();
    engine.register(key, 25, Duration::from_secs(60), false).unwrap();

    let handles: Vec<_> = (0..100)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.check_and_record(&key, Timestamp::from_millis(i % 7)))
        })
        .collect();

    let outcomes: Vec<UseOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(admitted_count(&outcomes), 25);
    assert!(outcomes
        .iter()
        .filter(|o| !o.is_admitted())
        .all(|o| matches!(o, UseOutcome::Denied { .. }) && o.usage_left() == 0));
}

#[test]
fn fewer_callers_than_limit_are_all_admitted() {
    let engine = Arc::new(QuotaEngine::new());
    let key = ApiKey::new();
    engine.register(key, 50, Duration::from_secs(60), false).unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.check_and_record(&key, Timestamp::from_millis(0)))
        })
        .collect();

    let outcomes: Vec<UseOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(admitted_count(&outcomes), 20);
}

#[test]
fn distinct_keys_are_isolated_under_contention() {
    let engine = Arc::new(QuotaEngine::new());
    let keys: Vec<ApiKey> = (0..16).map(|_| ApiKey::new()).collect();
    for key in &keys {
        engine.register(*key, 3, Duration::from_secs(60), false).unwrap();
    }
    let unknown = ApiKey::new();

    let handles: Vec<_> = keys
        .iter()
        .flat_map(|key| std::iter::repeat(*key).take(10))
        .chain(std::iter::repeat(unknown).take(10))
        .map(|key| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || (key, engine.check_and_record(&key, Timestamp::from_millis(0))))
        })
        .collect();

    let results: Vec<(ApiKey, UseOutcome)> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for key in &keys {
        let admitted = results
            .iter()
            .filter(|(k, outcome)| k == key && outcome.is_admitted())
            .count();
        assert_eq!(admitted, 3, "key {} admitted {}", key, admitted);
    }
    assert!(results
        .iter()
        .filter(|(k, _)| *k == unknown)
        .all(|(_, outcome)| *outcome == UseOutcome::NotFound));
}

#[test]
fn forced_overwrite_racing_uses_never_exceeds_new_limit() {
    for _ in 0..20 {
        let engine = Arc::new(QuotaEngine::new());
        let key = ApiKey::new();
        engine.register(key, 1_000, Duration::from_secs(60), false).unwrap();

        let admitted_after_reset = Arc::new(AtomicUsize::new(0));
        let reset_done = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let users: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let reset_done = Arc::clone(&reset_done);
                let admitted_after_reset = Arc::clone(&admitted_after_reset);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let observed_reset = reset_done.load(Ordering::SeqCst);
                        let outcome = engine.check_and_record(&key, Timestamp::from_millis(0));
                        if observed_reset && outcome.is_admitted() {
                            admitted_after_reset.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        let outcome = engine.register(key, 2, Duration::from_secs(60), true).unwrap();
        reset_done.store(true, Ordering::SeqCst);
        assert_eq!(outcome, RegistrationOutcome::Overwritten);

        for user in users {
            user.join().unwrap();
        }

        // Anything that started after the reset ran against the new contract
        assert!(admitted_after_reset.load(Ordering::SeqCst) <= 2);
        assert!(engine.usage(&key, Timestamp::from_millis(0)).unwrap() <= 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tokio_tasks_on_one_key_are_linearized() {
    let engine = Arc::new(QuotaEngine::new());
    let key = ApiKey::new();
    engine.register(key, 10, Duration::from_secs(60), false).unwrap();

    let tasks = (0..64).map(|_| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.check_and_record(&key, Timestamp::from_millis(5)) })
    });

    let outcomes: Vec<UseOutcome> = futures_util::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(admitted_count(&outcomes), 10);
}

#[test]
fn concurrent_registration_of_one_key_creates_once() {
    let engine = Arc::new(QuotaEngine::new());
    let key = ApiKey::new();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.register(key, i + 1, Duration::from_secs(1), false).unwrap())
        })
        .collect();

    let outcomes: Vec<RegistrationOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(outcomes.iter().filter(|o| **o == RegistrationOutcome::Created).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| **o == RegistrationOutcome::Conflict).count(), 31);
}
