//! Error types for the pipeline monitor.

use crate::config::ConfigurationError;
use crate::health::AggregationError;
use crate::services::{NotifyError, StoreError};
use thiserror::Error;

/// Crate-level error covering every fallible operation of the monitor.
///
/// Probe failures never appear here: they are always folded into a
/// `CheckResult` with `ok = false` at the probe boundary.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("{0}")]
    Aggregation(#[from] AggregationError),

    #[error("Circuit breaker open for {pipeline}")]
    CircuitOpen { pipeline: String },

    #[error("Health check timed out after {timeout_ms}ms for {pipeline}")]
    Timeout { pipeline: String, timeout_ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    /// True when the call was rejected without any check running.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, MonitorError::CircuitOpen { .. })
    }
}

pub type MonitorResult<T> = std::result::Result<T, MonitorError>;
