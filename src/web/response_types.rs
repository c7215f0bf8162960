//! # Web API Error Types
//!
//! Error responses never carry internal detail; the cause is logged by the
//! handler before conversion.

use crate::recovery::RecoveryOutcome;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to retrieve status")]
    StatusUnavailable,

    #[error("Recovery failed")]
    RecoveryFailed(RecoveryOutcome),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::StatusUnavailable => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STATUS_UNAVAILABLE",
                "Failed to retrieve status",
            ),
            // The outcome is the documented failure body
            ApiError::RecoveryFailed(outcome) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(outcome)).into_response()
            }
        }
    }
}

fn error_response(status_code: StatusCode, error_code: &str, message: &str) -> Response {
    let body = json!({
        "error": {
            "code": error_code,
            "message": message
        }
    });
    (status_code, Json(body)).into_response()
}

/// Body of `POST /api/pipeline/recover`; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoverRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
