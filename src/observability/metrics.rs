use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use crate::error::Result;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Registration metrics
    pub static ref REGISTRATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("quota_registrations_total", "Key registrations by outcome"),
        &["outcome"]
    ).expect("valid registrations metric");

    pub static ref REGISTERED_KEYS: IntGauge = IntGauge::new(
        "quota_registered_keys",
        "Number of registered API keys"
    ).expect("valid registered keys metric");

    // Use metrics
    pub static ref USE_DECISIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("quota_use_decisions_total", "Use requests by decision"),
        &["outcome"]
    ).expect("valid use decisions metric");

    // Latency metrics
    pub static ref CHECK_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "quota_check_latency_seconds",
            "Time spent evaluating one use request"
        ).buckets(vec![0.000_001, 0.000_01, 0.000_1, 0.001, 0.01])
    ).expect("valid check latency metric");
}

/// Adds all quota metrics to `REGISTRY`. Safe to call more than once.
pub fn register_metrics() -> Result<()> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(REGISTRATIONS.clone()),
        Box::new(REGISTERED_KEYS.clone()),
        Box::new(USE_DECISIONS.clone()),
        Box::new(CHECK_LATENCY.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Text exposition of everything in `REGISTRY`.
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
