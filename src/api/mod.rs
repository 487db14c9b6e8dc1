use std::sync::Arc;
use crate::quota::QuotaEngine;
use crate::types::timestamp::{Clock, SystemClock};

pub mod auth;
pub mod duration;
pub mod rest;
pub mod validation;

/// Shared state handed to every handler.
pub struct AppState {
    pub engine: Arc<QuotaEngine>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(engine: Arc<QuotaEngine>, clock: Arc<dyn Clock>) -> Self {
        AppState { engine, clock }
    }

    pub fn with_system_clock(engine: Arc<QuotaEngine>) -> Self {
        Self::new(engine, Arc::new(SystemClock::new()))
    }
}
