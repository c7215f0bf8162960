//! Transition hook through which breaker state changes reach the outside world.

use crate::resilience::CircuitState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single breaker state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Breaker (pipeline) name
    pub component: String,
    pub from: CircuitState,
    pub to: CircuitState,
    /// Rolling window size at the moment of transition
    pub window_samples: usize,
    pub window_failure_percentage: f64,
    /// Set when an operator forced the transition
    pub forced: bool,
    pub at: DateTime<Utc>,
}

/// Receives breaker transitions in the order they happen.
///
/// Implementations must handle their own failures: the breaker never looks
/// at what a reporter did, so nothing here can influence breaker state.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn on_open(&self, event: &TransitionEvent);

    async fn on_half_open(&self, event: &TransitionEvent);

    async fn on_close(&self, event: &TransitionEvent);
}

/// Reporter that ignores every transition
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatusReporter;

#[async_trait]
impl StatusReporter for NoopStatusReporter {
    async fn on_open(&self, _event: &TransitionEvent) {}

    async fn on_half_open(&self, _event: &TransitionEvent) {}

    async fn on_close(&self, _event: &TransitionEvent) {}
}
