use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Registration Errors
    #[error("Invalid quota limit: {0} (expected 1..{})", i32::MAX)]
    InvalidLimit(u32),

    #[error("Invalid window: must be a positive whole number of milliseconds")]
    InvalidWindow,

    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Logging setup failed: {0}")]
    LoggingInit(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::ConfigError(e.to_string())
    }
}
