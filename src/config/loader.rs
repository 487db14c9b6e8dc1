use crate::config::{LoggingConfig, ServerConfig};
use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Selects `config/{env}.toml` on top of `config/default.toml`.
pub const ENV_VAR: &str = "QUOTA_GATE_ENV";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Layers defaults, `config/default`, `config/{env}` and `QUOTA_GATE__*`
    /// environment variables, later sources winning.
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("QUOTA_GATE").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn load_from_env() -> Result<Self> {
        let env = std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_string());
        Self::load(&env)
    }
}
