use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use dashmap::DashMap;
use tracing::{debug, info, warn};
use crate::error::Result;
use crate::observability::metrics::{CHECK_LATENCY, REGISTERED_KEYS, REGISTRATIONS, USE_DECISIONS};
use crate::observability::tracing::{trace_key_registration, trace_quota_check};
use crate::registry::{KeyContract, RegistrationOutcome, Registry};
use crate::types::ids::ApiKey;
use crate::types::timestamp::Timestamp;
use super::{UsageLog, UseOutcome};

type LogSlot = Arc<Mutex<UsageLog>>;

/// Admission-control engine: the contract registry plus one usage log per key.
///
/// ## Locking
/// Every key's log sits behind its own mutex inside a sharded map, so uses of
/// different keys never wait on each other. Whenever both are needed the log
/// mutex is taken first and the registry shard second:
///
/// - `check_and_record` locks the log, then reads the contract;
/// - a forced `register` locks the log, then writes the contract and clears the log.
///
/// A use therefore always sees a contract and a log from the same registration.
pub struct QuotaEngine {
    registry: Registry,
    logs: DashMap<ApiKey, LogSlot>,
}

impl QuotaEngine {
    pub fn new() -> Self {
        QuotaEngine {
            registry: Registry::new(),
            logs: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers `key` with `limit` uses per `window`.
    ///
    /// Fails only on an invalid contract. A taken key yields `Conflict` unless
    /// `force` is set, in which case the contract is replaced and the key's
    /// usage starts over.
    ///
    /// Usage is tracked at millisecond precision, so `window` must be a whole
    /// number of milliseconds; `1.9ms` is rejected rather than rounded.
    pub fn register(
        &self,
        key: ApiKey,
        limit: u32,
        window: Duration,
        force: bool,
    ) -> Result<RegistrationOutcome> {
        let _span = trace_key_registration(&key).entered();
        let contract = KeyContract::new(key, limit, window)?;

        let outcome = if force {
            self.force_register(contract)
        } else {
            self.registry.register(contract, false)
        };

        match outcome {
            RegistrationOutcome::Conflict => {
                warn!(%key, "Key already registered, overwrite requires force");
            }
            RegistrationOutcome::Created => {
                // Keys are never removed, so the gauge only ever moves up
                REGISTERED_KEYS.inc();
                info!(%key, limit, window_ms = contract.window_millis(), outcome = outcome.as_str(), "Key registered");
            }
            RegistrationOutcome::Overwritten => {
                info!(%key, limit, window_ms = contract.window_millis(), outcome = outcome.as_str(), "Key registered");
            }
        }

        REGISTRATIONS.with_label_values(&[outcome.as_str()]).inc();

        Ok(outcome)
    }

    fn force_register(&self, contract: KeyContract) -> RegistrationOutcome {
        // Brand-new keys have no usage to fence off
        if !self.registry.contains(&contract.key) {
            if let RegistrationOutcome::Created = self.registry.register(contract, false) {
                return RegistrationOutcome::Created;
            }
        }

        let slot = self.slot(contract.key);
        let mut log = lock(&slot);
        let outcome = self.registry.register(contract, true);
        log.clear();
        outcome
    }

    /// Evaluates one use of `key` at `now`, recording it when admitted.
    pub fn check_and_record(&self, key: &ApiKey, now: Timestamp) -> UseOutcome {
        let _span = trace_quota_check(key).entered();
        let started = Instant::now();

        let outcome = self.evaluate(key, now);

        CHECK_LATENCY.observe(started.elapsed().as_secs_f64());
        USE_DECISIONS.with_label_values(&[outcome.as_str()]).inc();
        debug!(
            %key,
            outcome = outcome.as_str(),
            usage_left = outcome.usage_left(),
            ms_until_reset = outcome.ms_until_reset(),
            "Use evaluated"
        );

        outcome
    }

    fn evaluate(&self, key: &ApiKey, now: Timestamp) -> UseOutcome {
        // Unknown keys never get a log
        if !self.registry.contains(key) {
            return UseOutcome::NotFound;
        }

        let slot = self.slot(*key);
        let mut log = lock(&slot);

        match self.registry.lookup(key) {
            Some(contract) => log.check_and_record(&contract, now),
            None => UseOutcome::NotFound,
        }
    }

    /// Uses of `key` still inside its window at `now`, or `None` if the key
    /// is not registered. Does not evict.
    pub fn usage(&self, key: &ApiKey, now: Timestamp) -> Option<usize> {
        let contract = self.registry.lookup(key)?;
        let slot = match self.logs.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Some(0),
        };

        let log = lock(&slot);
        Some(log.live_count(contract.window_millis(), now))
    }

    /// Number of keys that have a usage log.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    fn slot(&self, key: ApiKey) -> LogSlot {
        // Clone the Arc so the shard guard is released before the log mutex is taken
        Arc::clone(
            self.logs
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(UsageLog::new())))
                .value(),
        )
    }
}

impl Default for QuotaEngine {
    fn default() -> Self {
        Self::new()
    }
}

// Log operations never leave a half-updated deque behind, so a poisoned lock is still usable
fn lock(slot: &LogSlot) -> MutexGuard<'_, UsageLog> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
