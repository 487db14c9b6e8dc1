pub mod contract;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use crate::types::ids::ApiKey;

pub use contract::{KeyContract, RegistrationOutcome, MAX_LIMIT};

/// Key → contract map.
///
/// Backed by a sharded map so registrations and lookups of different keys do
/// not serialize on one lock. Resetting usage on overwrite is the engine's job;
/// see `QuotaEngine::register`.
pub struct Registry {
    contracts: DashMap<ApiKey, KeyContract>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            contracts: DashMap::new(),
        }
    }

    /// Inserts `contract` unless its key is taken.
    ///
    /// With `force` an existing contract is replaced. The existence check and
    /// the write happen under the key's shard lock.
    pub fn register(&self, contract: KeyContract, force: bool) -> RegistrationOutcome {
        match self.contracts.entry(contract.key) {
            Entry::Vacant(vacant) => {
                vacant.insert(contract);
                RegistrationOutcome::Created
            }
            Entry::Occupied(_) if !force => RegistrationOutcome::Conflict,
            Entry::Occupied(mut occupied) => {
                occupied.insert(contract);
                RegistrationOutcome::Overwritten
            }
        }
    }

    pub fn lookup(&self, key: &ApiKey) -> Option<KeyContract> {
        self.contracts.get(key).map(|entry| *entry.value())
    }

    pub fn contains(&self, key: &ApiKey) -> bool {
        self.contracts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
