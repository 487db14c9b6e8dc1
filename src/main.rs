use std::sync::Arc;
use anyhow::Context;
use quota_gate::api::{AppState, rest::create_router};
use quota_gate::config::AppConfig;
use quota_gate::observability::{metrics, tracing as telemetry};
use quota_gate::quota::QuotaEngine;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_from_env().context("loading configuration")?;
    telemetry::init(&config.logging).context("initialising logging")?;
    metrics::register_metrics().context("registering metrics")?;

    let engine = Arc::new(QuotaEngine::new());
    let app = create_router(Arc::new(AppState::with_system_clock(engine)));

    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    tracing::info!("Listening on {}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
