use std::time::Duration;
use proptest::prelude::*;
use quota_gate::quota::{QuotaEngine, UseOutcome};
use quota_gate::types::ids::ApiKey;
use quota_gate::types::timestamp::Timestamp;

proptest! {
    #[test]
    fn exactly_limit_admitted_within_one_window(
        limit in 1u32..50,
        window_ms in 1u64..100_000,
        extra in 1usize..20,
    ) {
        let engine = QuotaEngine::new();
        let key = ApiKey::new();
        engine.register(key, limit, Duration::from_millis(window_ms), false).unwrap();

        let calls = limit as usize + extra;
        // All calls land inside a span shorter than the window
        let outcomes: Vec<UseOutcome> = (0..calls)
            .map(|i| engine.check_and_record(&key, Timestamp::from_millis((i as u64) % window_ms)))
            .collect();

        let admitted = outcomes.iter().filter(|o| o.is_admitted()).count();
        prop_assert_eq!(admitted, limit as usize);
        prop_assert!(outcomes[limit as usize..].iter().all(|o| !o.is_admitted()));
    }

    #[test]
    fn usage_left_and_reset_stay_in_bounds(
        limit in 1u32..10,
        window_ms in 1u64..1_000,
        steps in proptest::collection::vec(0u64..300, 1..100),
    ) {
        let engine = QuotaEngine::new();
        let key = ApiKey::new();
        engine.register(key, limit, Duration::from_millis(window_ms), false).unwrap();

        let mut now = 0u64;
        for step in steps {
            now += step;
            let outcome = engine.check_and_record(&key, Timestamp::from_millis(now));
            let live = engine.usage(&key, Timestamp::from_millis(now)).unwrap();

            prop_assert!(outcome.usage_left() <= limit);
            prop_assert!(live <= limit as usize);
            match outcome {
                UseOutcome::Admitted { usage_left, ms_until_reset } => {
                    prop_assert_eq!(usage_left as usize, limit as usize - live);
                    prop_assert!(ms_until_reset > 0 && ms_until_reset <= window_ms);
                }
                UseOutcome::Denied { ms_until_reset } => {
                    prop_assert_eq!(live, limit as usize);
                    prop_assert!(ms_until_reset > 0 && ms_until_reset <= window_ms);
                }
                UseOutcome::NotFound => prop_assert!(false, "registered key reported missing"),
            }
        }
    }

    #[test]
    fn slot_reclaimed_only_after_window(window_ms in 1u64..10_000, early in 0u64..10_000) {
        let early = early % (window_ms + 1);
        let engine = QuotaEngine::new();
        let key = ApiKey::new();
        engine.register(key, 1, Duration::from_millis(window_ms), false).unwrap();

        prop_assert!(engine.check_and_record(&key, Timestamp::from_millis(0)).is_admitted());
        prop_assert!(!engine.check_and_record(&key, Timestamp::from_millis(early)).is_admitted());
        prop_assert!(engine.check_and_record(&key, Timestamp::from_millis(window_ms + 1)).is_admitted());
    }
}
