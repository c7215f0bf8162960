//! # Health Check Types
//!
//! Definitions and results flowing through the probe executors and the
//! health aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

fn default_method() -> String {
    "GET".to_string()
}

fn default_check_timeout_ms() -> u64 {
    3_000
}

/// Kind of verification a check performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// HTTP reachability probe against a URL
    #[serde(alias = "HTTP")]
    Http,
    /// Marker write against a store table
    #[serde(alias = "DB_WRITE", alias = "dbwrite")]
    DbWrite,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Http => f.write_str("http"),
            CheckKind::DbWrite => f.write_str("db_write"),
        }
    }
}

/// A statically configured health check.
///
/// The configured sequence defines reporting order only; checks run
/// independently of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub name: String,
    pub kind: CheckKind,
    /// URL for `http` checks, table name for `db_write` checks
    #[serde(default)]
    pub target: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_check_timeout_ms")]
    pub timeout_ms: u64,
}

impl CheckDefinition {
    pub fn http(name: impl Into<String>, url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            name: name.into(),
            kind: CheckKind::Http,
            target: url.into(),
            method: default_method(),
            timeout_ms,
        }
    }

    pub fn db_write(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CheckKind::DbWrite,
            target: table.into(),
            method: default_method(),
            timeout_ms: default_check_timeout_ms(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }
}

/// Detail attached to a check result: an HTTP status or a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckDetail {
    Status(u16),
    Message(String),
}

impl fmt::Display for CheckDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckDetail::Status(code) => write!(f, "{code}"),
            CheckDetail::Message(msg) => f.write_str(msg),
        }
    }
}

impl From<u16> for CheckDetail {
    fn from(code: u16) -> Self {
        CheckDetail::Status(code)
    }
}

impl From<String> for CheckDetail {
    fn from(msg: String) -> Self {
        CheckDetail::Message(msg)
    }
}

impl From<&str> for CheckDetail {
    fn from(msg: &str) -> Self {
        CheckDetail::Message(msg.to_string())
    }
}

/// Normalized outcome of a single probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub name: String,
    pub ok: bool,
    pub detail: CheckDetail,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn passed(name: impl Into<String>, detail: impl Into<CheckDetail>, elapsed_ms: u64) -> Self {
        Self {
            name: name.into(),
            ok: true,
            detail: detail.into(),
            elapsed_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<CheckDetail>, elapsed_ms: u64) -> Self {
        Self {
            name: name.into(),
            ok: false,
            detail: detail.into(),
            elapsed_ms,
            completed_at: Utc::now(),
        }
    }
}

/// Per-check entry of an aggregate summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The probe ran to completion, passing or failing
    #[serde(rename = "fulfilled")]
    Completed(CheckResult),
    /// The probe faulted before it could produce a result
    Rejected { name: String, reason: String },
}

impl CheckOutcome {
    pub fn name(&self) -> &str {
        match self {
            CheckOutcome::Completed(result) => &result.name,
            CheckOutcome::Rejected { name, .. } => name,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CheckOutcome::Completed(result) if result.ok)
    }
}

/// Reduction of one health cycle.
///
/// `passed + failed == total == details.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub pipeline_name: String,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub details: Vec<CheckOutcome>,
}

impl AggregateSummary {
    pub fn from_outcomes(pipeline_name: impl Into<String>, details: Vec<CheckOutcome>) -> Self {
        let total = details.len();
        let passed = details.iter().filter(|outcome| outcome.is_ok()).count();
        Self {
            pipeline_name: pipeline_name.into(),
            passed,
            failed: total - passed,
            total,
            details,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.failed == 0
    }

    /// Names of the checks that did not pass, in configured order
    pub fn failed_checks(&self) -> Vec<&str> {
        self.details
            .iter()
            .filter(|outcome| !outcome.is_ok())
            .map(CheckOutcome::name)
            .collect()
    }
}

/// One or more checks failed; the full summary is attached
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Health failed: {}/{} checks", summary.failed, summary.total)]
pub struct AggregationError {
    pub summary: AggregateSummary,
}
