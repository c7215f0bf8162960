//! # Health Check Handlers

use crate::web::response_types::HealthResponse;
use axum::Json;

/// Liveness of the monitor process itself: GET /api/health
///
/// Independent of pipeline health and breaker state.
pub async fn basic_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
