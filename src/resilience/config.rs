//! # Circuit Breaker Configuration
//!
//! Thresholds and timings for the pipeline circuit breaker. Built from
//! [`crate::config::BreakerSettings`] at startup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Upper bound on a single protected call; elapsing counts as a failure
    pub timeout: Duration,

    /// Failure percentage (1-100) of the rolling window that opens the circuit
    pub error_threshold_percentage: u8,

    /// Minimum outcomes in the rolling window before the rate is evaluated
    pub volume_threshold: u32,

    /// Time spent open before a trial call is allowed
    pub reset_timeout: Duration,

    /// Age limit of outcomes in the rolling window
    pub rolling_window: Duration,

    /// Hard cap on outcomes held in the rolling window
    pub max_window_samples: usize,
}

impl CircuitBreakerConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("timeout must be greater than 0".to_string());
        }

        if self.error_threshold_percentage == 0 || self.error_threshold_percentage > 100 {
            return Err("error_threshold_percentage must be between 1 and 100".to_string());
        }

        if self.volume_threshold == 0 {
            return Err("volume_threshold must be greater than 0".to_string());
        }

        if self.reset_timeout.is_zero() {
            return Err("reset_timeout must be greater than 0".to_string());
        }

        if self.rolling_window.is_zero() {
            return Err("rolling_window must be greater than 0".to_string());
        }

        if self.max_window_samples < self.volume_threshold as usize {
            return Err("max_window_samples must be at least volume_threshold".to_string());
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            error_threshold_percentage: 50,
            volume_threshold: 5,
            reset_timeout: Duration::from_secs(15),
            rolling_window: Duration::from_secs(10),
            max_window_samples: 1_000,
        }
    }
}
