//! # Pipeline Health
//!
//! Check definitions, probe executors and the aggregator that reduces one
//! health cycle into a summary.

pub mod aggregator;
pub mod probes;
pub mod types;

pub use aggregator::HealthAggregator;
pub use probes::{probe_reachability, probe_write_capability, NetworkProbeExecutor, ProbeExecutor};
pub use types::{
    AggregateSummary, AggregationError, CheckDefinition, CheckDetail, CheckKind, CheckOutcome,
    CheckResult,
};
