//! # Pipeline Monitor Constants
//!
//! Status values, audit event types and the editor-facing suggestion catalog
//! shared by the breaker, the recovery workflow and the API layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Editor-facing health of the publishing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineHealth {
    Ok,
    Degraded,
    Down,
    /// No status has been persisted yet
    Unknown,
}

impl PipelineHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineHealth::Ok => "OK",
            PipelineHealth::Degraded => "DEGRADED",
            PipelineHealth::Down => "DOWN",
            PipelineHealth::Unknown => "UNKNOWN",
        }
    }

    /// Suggested action and editor message for this health value
    pub fn suggestion(&self) -> Suggestion {
        match self {
            PipelineHealth::Ok => Suggestion {
                action: "No action needed",
                message: "Pipeline healthy",
            },
            PipelineHealth::Degraded => Suggestion {
                action: "Allow auto-recovery to proceed; review logs",
                message: "Partial outage detected",
            },
            PipelineHealth::Down => Suggestion {
                action: "Retry recovery; if persists, escalate with incident ticket",
                message: "Publishing unavailable",
            },
            PipelineHealth::Unknown => Suggestion {
                action: "Await next health cycle",
                message: "Initializing",
            },
        }
    }
}

impl fmt::Display for PipelineHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PipelineHealth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(PipelineHealth::Ok),
            "DEGRADED" => Ok(PipelineHealth::Degraded),
            "DOWN" => Ok(PipelineHealth::Down),
            "UNKNOWN" => Ok(PipelineHealth::Unknown),
            other => Err(format!("unknown pipeline health: {other}")),
        }
    }
}

/// Entry in the suggestion catalog shown to editors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub action: &'static str,
    pub message: &'static str,
}

/// Audit trail event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    FailureDetected,
    CircuitHalfOpen,
    RecoverySucceeded,
    RecoveryAttempt,
    RecoveryFailed,
    Status,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::FailureDetected => "FAILURE_DETECTED",
            AuditEventType::CircuitHalfOpen => "CIRCUIT_HALF_OPEN",
            AuditEventType::RecoverySucceeded => "RECOVERY_SUCCEEDED",
            AuditEventType::RecoveryAttempt => "RECOVERY_ATTEMPT",
            AuditEventType::RecoveryFailed => "RECOVERY_FAILED",
            AuditEventType::Status => "STATUS",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FAILURE_DETECTED" => Ok(AuditEventType::FailureDetected),
            "CIRCUIT_HALF_OPEN" => Ok(AuditEventType::CircuitHalfOpen),
            "RECOVERY_SUCCEEDED" => Ok(AuditEventType::RecoverySucceeded),
            "RECOVERY_ATTEMPT" => Ok(AuditEventType::RecoveryAttempt),
            "RECOVERY_FAILED" => Ok(AuditEventType::RecoveryFailed),
            "STATUS" => Ok(AuditEventType::Status),
            other => Err(format!("unknown audit event type: {other}")),
        }
    }
}

/// Detail reported by a successful write probe
pub const DB_WRITE_OK: &str = "db-ok";

/// Timeout applied to the recovery warm-up probe
pub const WARM_UP_TIMEOUT_MS: u64 = 5_000;

/// Name used for the ad-hoc warm-up check
pub const WARM_UP_CHECK_NAME: &str = "warm-up";

/// Reason recorded when recovery is triggered without one
pub const DEFAULT_RECOVERY_REASON: &str = "manual";

/// Default bound for one status write, audit append or alert
pub const DEFAULT_SINK_TIMEOUT_MS: u64 = 5_000;
