//! # Pipeline Handlers
//!
//! Status query, recovery trigger and breaker view.

use crate::constants::PipelineHealth;
use crate::models::PipelineStatus;
use crate::recovery::RecoveryOutcome;
use crate::resilience::{CircuitBreakerMetrics, CircuitState};
use crate::web::response_types::{ApiError, RecoverRequest};
use crate::web::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

/// Current pipeline status: GET /api/pipeline/status
///
/// Answers in every breaker state. A store read failure is a 500 with a
/// generic body.
pub async fn get_status(State(state): State<AppState>) -> Result<Json<PipelineStatus>, ApiError> {
    state.monitor.current_status().await.map(Json).map_err(|e| {
        error!(
            pipeline = %state.monitor.pipeline_name(),
            error = %e,
            "Failed to retrieve pipeline status"
        );
        ApiError::StatusUnavailable
    })
}

/// Trigger recovery: POST /api/pipeline/recover
///
/// Body `{"reason": "..."}` is optional; an empty or unparsable body uses the
/// default reason. 200 with the outcome on success, 503 with the outcome on
/// failure.
pub async fn recover(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RecoveryOutcome>, ApiError> {
    let request: RecoverRequest = serde_json::from_slice(&body).unwrap_or_default();
    info!(
        pipeline = %state.monitor.pipeline_name(),
        reason = ?request.reason,
        "Recovery requested"
    );

    let outcome = state
        .monitor
        .attempt_recovery(request.reason.as_deref())
        .await;

    if outcome.ok {
        Ok(Json(outcome))
    } else {
        Err(ApiError::RecoveryFailed(outcome))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitResponse {
    pub pipeline: String,
    pub circuit_state: CircuitState,
    pub health: PipelineHealth,
    pub metrics: CircuitBreakerMetrics,
}

/// Breaker view: GET /api/pipeline/circuit
pub async fn get_circuit(State(state): State<AppState>) -> Json<CircuitResponse> {
    let metrics = state.monitor.breaker_metrics();
    Json(CircuitResponse {
        pipeline: state.monitor.pipeline_name().to_string(),
        circuit_state: metrics.current_state,
        health: metrics.current_state.health(),
        metrics,
    })
}
