//! # Event Sink Adapters
//!
//! The only path by which breaker transitions and recovery steps reach the
//! status store, the audit log and the alert channel. Every write here is
//! best-effort: failures are logged and counted, never returned.

pub mod audit_trail;
pub mod metrics;
pub mod status_reporter;

pub use audit_trail::AuditTrail;
pub use metrics::{SinkMetrics, SinkMetricsSnapshot};
pub use status_reporter::PipelineStatusReporter;
