//! Breaker-wrapped health cycle.

use crate::error::MonitorError;
use crate::health::{AggregateSummary, AggregationError, HealthAggregator};
use crate::resilience::{CircuitBreaker, CircuitBreakerError};
use std::sync::Arc;

/// Runs the configured health checks through the pipeline breaker.
///
/// Every scheduled cycle goes through [`HealthCircuit::fire`]; recovery calls
/// the aggregator directly and never passes through here.
#[derive(Debug, Clone)]
pub struct HealthCircuit {
    breaker: CircuitBreaker,
    aggregator: Arc<HealthAggregator>,
}

impl HealthCircuit {
    pub fn new(breaker: CircuitBreaker, aggregator: Arc<HealthAggregator>) -> Self {
        Self {
            breaker,
            aggregator,
        }
    }

    /// Run one health cycle under breaker protection
    pub async fn fire(&self) -> Result<AggregateSummary, CircuitBreakerError<AggregationError>> {
        let aggregator = Arc::clone(&self.aggregator);
        self.breaker
            .call(|| async move { aggregator.aggregate_configured().await })
            .await
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn aggregator(&self) -> &Arc<HealthAggregator> {
        &self.aggregator
    }
}

impl From<CircuitBreakerError<AggregationError>> for MonitorError {
    fn from(err: CircuitBreakerError<AggregationError>) -> Self {
        match err {
            CircuitBreakerError::CircuitOpen { component } => {
                MonitorError::CircuitOpen { pipeline: component }
            }
            CircuitBreakerError::OperationFailed(err) => MonitorError::Aggregation(err),
            CircuitBreakerError::Timeout { component, timeout } => MonitorError::Timeout {
                pipeline: component,
                timeout_ms: timeout.as_millis() as u64,
            },
        }
    }
}
