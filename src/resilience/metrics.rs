//! # Circuit Breaker Metrics
//!
//! Point-in-time view of a breaker's counters and rolling window, used by the
//! API layer and by operators reading logs.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};

/// Metrics snapshot for a circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Current circuit breaker state
    pub current_state: CircuitState,

    /// Calls that reached the protected operation
    pub total_calls: u64,

    /// Number of successful calls
    pub success_count: u64,

    /// Number of failed calls, timeouts included
    pub failure_count: u64,

    /// Calls that exceeded the breaker timeout
    pub timeout_count: u64,

    /// Calls rejected without running the operation
    pub rejected_count: u64,

    /// Outcomes currently held in the rolling window
    pub window_samples: usize,

    /// Failure percentage of the rolling window (0.0 to 100.0)
    pub window_failure_percentage: f64,
}

impl CircuitBreakerMetrics {
    /// Check if metrics indicate healthy operation
    pub fn is_healthy(&self) -> bool {
        self.current_state == CircuitState::Closed
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Rejecting all calls",
            CircuitState::HalfOpen => "Recovering - Testing system health",
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "State: {} | Calls: {} | Failures: {} | Timeouts: {} | Rejected: {} | Window: {} samples, {:.1}% failed",
            self.state_description(),
            self.total_calls,
            self.failure_count,
            self.timeout_count,
            self.rejected_count,
            self.window_samples,
            self.window_failure_percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_state_and_window() {
        let metrics = CircuitBreakerMetrics {
            current_state: CircuitState::Open,
            total_calls: 5,
            success_count: 0,
            failure_count: 5,
            timeout_count: 1,
            rejected_count: 2,
            window_samples: 5,
            window_failure_percentage: 100.0,
        };

        assert!(!metrics.is_healthy());
        let summary = metrics.format_summary();
        assert!(summary.contains("Failing - Rejecting all calls"));
        assert!(summary.contains("100.0% failed"));
    }
}
