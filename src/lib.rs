#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pipeline Monitor
//!
//! Health aggregation, circuit breaking and automated recovery for a content
//! publishing pipeline.
//!
//! ## Overview
//!
//! A fixed set of health checks (HTTP reachability and store write capability)
//! runs concurrently on a schedule. The aggregated result feeds a circuit
//! breaker whose state transitions become editor-facing status, audit events
//! and operator alerts. A recovery workflow re-verifies the pipeline on demand
//! without touching breaker state.
//!
//! ## Module Organization
//!
//! - [`health`] - Check definitions, probe executors and the aggregator
//! - [`resilience`] - Circuit breaker and the breaker-wrapped health cycle
//! - [`recovery`] - Coalesced recovery attempts
//! - [`reporting`] - Sink adapters for status, audit and alerts
//! - [`services`] - Store and notifier capabilities with in-memory and networked backends
//! - [`monitor`] - Facade wiring everything from configuration
//! - [`scheduler`] - Periodic health cycle
//! - [`web`] - HTTP API
//! - [`config`] - Layered configuration and validation
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipeline_monitor::config::ConfigManager;
//! use pipeline_monitor::monitor::PipelineMonitor;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let monitor = PipelineMonitor::from_config(Arc::new(manager.config().clone())).await?;
//! monitor.initialize().await?;
//!
//! match monitor.fire().await {
//!     Ok(summary) => println!("{}/{} checks passed", summary.passed, summary.total),
//!     Err(e) => println!("health cycle failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod health;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod recovery;
pub mod reporting;
pub mod resilience;
pub mod scheduler;
pub mod services;
pub mod web;

pub use config::{ConfigManager, MonitorConfig};
pub use constants::{AuditEventType, PipelineHealth};
pub use error::{MonitorError, MonitorResult};
pub use health::{AggregateSummary, AggregationError, CheckDefinition, CheckKind, CheckResult};
pub use monitor::PipelineMonitor;
pub use recovery::RecoveryOutcome;
pub use resilience::{CircuitBreaker, CircuitState};
