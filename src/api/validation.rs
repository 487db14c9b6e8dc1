use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::api::duration::parse_iso8601;
use crate::error::{Error, Result};
use crate::registry::MAX_LIMIT;
use crate::types::ids::ApiKey;

/// Body of `POST /register`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub api_key: String,
    pub quota: i64,
    /// ISO-8601 duration, e.g. `PT10S` or `PT0.200S`.
    pub time_limit: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    pub key: ApiKey,
    pub limit: u32,
    pub window: Duration,
    pub force: bool,
}

/// Checks every field and reports all violations at once.
pub fn validate(request: &RegisterRequest) -> Result<Registration> {
    let mut violations = Vec::new();

    let key = ApiKey::from_string(&request.api_key);
    if key.is_err() {
        violations.push("apiKey: should be a UUID".to_string());
    }

    let limit = u32::try_from(request.quota)
        .ok()
        .filter(|limit| (1..=MAX_LIMIT).contains(limit));
    if limit.is_none() {
        violations.push(format!("quota: must be between 1 and {}", MAX_LIMIT));
    }

    let window = match parse_iso8601(&request.time_limit) {
        Ok(window) if window.is_zero() => {
            violations.push("timeLimit: must be finite and greater than 0".to_string());
            None
        }
        Ok(window) if window.subsec_nanos() % 1_000_000 != 0 => {
            violations.push("timeLimit: must be a whole number of milliseconds".to_string());
            None
        }
        Ok(window) => Some(window),
        Err(e) => {
            violations.push(format!("timeLimit: {}", e));
            None
        }
    };

    match (key, limit, window) {
        (Ok(key), Some(limit), Some(window)) => Ok(Registration {
            key,
            limit,
            window,
            force: request.force,
        }),
        _ => Err(Error::ValidationFailed(violations)),
    }
}
