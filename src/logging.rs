//! # Structured Logging Module
//!
//! Environment-aware console logging using the tracing ecosystem. Logs go to
//! stdout so the container runtime can collect them; JSON output is available
//! for log shippers.

use crate::config::{LogFormat, LoggingConfig};
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Environment variable naming the deployment environment
pub const ENVIRONMENT_ENV: &str = "PIPELINE_MONITOR_ENV";

/// Initialize structured logging once per process.
///
/// `RUST_LOG` wins over the configured level, which wins over the
/// environment default. An already-installed global subscriber is left alone.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let directive = config
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(&environment).to_string());
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

        let layer = match config.format {
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(std::io::stdout().is_terminal())
                .with_filter(filter)
                .boxed(),
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
            return;
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            format = ?config.format,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(ENVIRONMENT_ENV)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log a collaborator failure with full context.
///
/// Collaborator failures are never propagated into breaker or recovery logic,
/// so this is the only place they surface.
pub fn log_collaborator_failure(collaborator: &str, operation: &str, pipeline: &str, error: &str) {
    tracing::error!(
        collaborator = %collaborator,
        operation = %operation,
        pipeline = %pipeline,
        error = %error,
        "Collaborator call failed"
    );
}
