use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use crate::types::ids::ApiKey;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Fails if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::LoggingInit(e.to_string()))
}

pub fn trace_quota_check(key: &ApiKey) -> Span {
    tracing::debug_span!(
        "quota_check",
        key = %key,
    )
}

pub fn trace_key_registration(key: &ApiKey) -> Span {
    tracing::info_span!(
        "key_registration",
        key = %key,
    )
}
