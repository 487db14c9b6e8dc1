pub mod types;
pub mod error;
pub mod config;
pub mod registry;
pub mod quota;
pub mod observability;
pub mod api;

pub use error::{Error, Result};
pub use quota::{QuotaEngine, UseOutcome};
pub use registry::{KeyContract, RegistrationOutcome, Registry};
