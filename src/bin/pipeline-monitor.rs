//! # Pipeline Monitor Server
//!
//! Runs the scheduled health cycle and serves the pipeline API.
//!
//! ## Usage
//!
//! ```bash
//! # Default configuration file: config/pipeline-monitor.toml
//! cargo run --bin pipeline-monitor
//!
//! # Explicit file plus an environment override
//! PIPELINE_MONITOR_CONFIG=/etc/pipeline-monitor.toml \
//!   PIPELINE_MONITOR__PORT=9090 cargo run --bin pipeline-monitor
//! ```

use anyhow::Context;
use pipeline_monitor::config::ConfigManager;
use pipeline_monitor::logging;
use pipeline_monitor::monitor::PipelineMonitor;
use pipeline_monitor::scheduler::HealthScheduler;
use pipeline_monitor::web::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let manager = ConfigManager::load().context("Failed to load pipeline monitor configuration")?;
    let config = Arc::new(manager.config().clone());

    logging::init_structured_logging(&config.logging);

    info!("🚀 Starting Pipeline Monitor...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));
    info!("   Pipeline: {}", config.pipeline_name);
    info!("   Configuration: {}", manager.source());

    let monitor = Arc::new(
        PipelineMonitor::from_config(Arc::clone(&config))
            .await
            .context("Failed to build pipeline monitor")?,
    );
    monitor
        .initialize()
        .await
        .context("Failed to seed initial pipeline status")?;

    let scheduler = HealthScheduler::new(Arc::clone(&monitor), config.health_interval()).spawn();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🎉 Pipeline Monitor listening on {}", addr);
    info!("   Press Ctrl+C to shutdown gracefully");

    let app = create_router(AppState::new(Arc::clone(&monitor)));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("🛑 Shutdown signal received, stopping health scheduler...");
    scheduler.abort();

    info!(
        state = %monitor.circuit_state(),
        metrics = %monitor.breaker_metrics().format_summary(),
        "👋 Pipeline Monitor shutdown complete"
    );

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
