use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::types::ids::ApiKey;
use crate::types::timestamp::duration_millis;

/// Largest accepted limit is one below `i32::MAX`.
pub const MAX_LIMIT: u32 = (i32::MAX - 1) as u32;

/// The (limit, window) pair registered for a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyContract {
    pub key: ApiKey,
    pub limit: u32,
    pub window: Duration,
}

impl KeyContract {
    /// Builds a contract, rejecting limits outside `1..=MAX_LIMIT` and windows
    /// that are not a positive whole number of milliseconds.
    pub fn new(key: ApiKey, limit: u32, window: Duration) -> Result<Self> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(Error::InvalidLimit(limit));
        }

        if duration_millis(window) == 0 || window.subsec_nanos() % 1_000_000 != 0 {
            return Err(Error::InvalidWindow);
        }

        Ok(KeyContract { key, limit, window })
    }

    pub fn window_millis(&self) -> u64 {
        duration_millis(self.window)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    Overwritten,
    Conflict,
}

impl RegistrationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationOutcome::Created => "created",
            RegistrationOutcome::Overwritten => "overwritten",
            RegistrationOutcome::Conflict => "conflict",
        }
    }
}
