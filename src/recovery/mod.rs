//! # Recovery
//!
//! Operator- or schedule-initiated recovery attempts. Recovery runs the health
//! aggregator directly and never changes breaker state; the breaker closes on
//! its own trial once the pipeline is healthy again.

pub mod orchestrator;

pub use orchestrator::{RecoveryOrchestrator, RecoveryOutcome};
