use std::collections::VecDeque;
use crate::registry::KeyContract;
use crate::types::timestamp::Timestamp;
use super::UseOutcome;

/// Admitted-use timestamps for one key, oldest at the front.
///
/// Holds at most `limit` entries; each timestamp is pushed once and popped
/// once, so eviction is amortized O(1) per use.
#[derive(Debug, Default)]
pub struct UsageLog {
    timestamps: VecDeque<Timestamp>,
}

impl UsageLog {
    pub fn new() -> Self {
        UsageLog {
            timestamps: VecDeque::new(),
        }
    }

    /// Evicts expired entries, then admits or denies one use at `now`.
    pub fn check_and_record(&mut self, contract: &KeyContract, now: Timestamp) -> UseOutcome {
        // Concurrent callers may read the clock before queueing on the lock
        let now = match self.timestamps.back() {
            Some(&newest) if newest > now => newest,
            _ => now,
        };

        self.evict_expired(contract.window_millis(), now);

        let count = self.timestamps.len();
        let limit = contract.limit as usize;

        if count < limit {
            self.timestamps.push_back(now);
            UseOutcome::Admitted {
                usage_left: (limit - count - 1) as u32,
                ms_until_reset: self.ms_until_reset(contract.window_millis(), now),
            }
        } else {
            UseOutcome::Denied {
                ms_until_reset: self.ms_until_reset(contract.window_millis(), now),
            }
        }
    }

    /// Pops entries older than `window_ms` relative to `now`, stopping at the
    /// first live one. Returns how many were removed.
    pub fn evict_expired(&mut self, window_ms: u64, now: Timestamp) -> usize {
        let mut evicted = 0;

        while let Some(&front) = self.timestamps.front() {
            if now.millis_since(front) > window_ms {
                self.timestamps.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }

        evicted
    }

    /// Live entries at `now` without evicting anything.
    pub fn live_count(&self, window_ms: u64, now: Timestamp) -> usize {
        self.timestamps
            .iter()
            .filter(|&&t| now.millis_since(t) <= window_ms)
            .count()
    }

    fn ms_until_reset(&self, window_ms: u64, now: Timestamp) -> u64 {
        match self.timestamps.front() {
            // An entry aged exactly `window_ms` is still live for one more millisecond
            Some(&oldest) => window_ms.saturating_sub(now.millis_since(oldest)).max(1),
            None => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn oldest(&self) -> Option<Timestamp> {
        self.timestamps.front().copied()
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }
}
