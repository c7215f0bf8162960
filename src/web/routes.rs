//! # Web API Route Definitions

use crate::web::handlers;
use crate::web::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Pipeline routes, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/pipeline/status", get(handlers::pipeline::get_status))
        .route("/pipeline/recover", post(handlers::pipeline::recover))
        .route("/pipeline/circuit", get(handlers::pipeline::get_circuit))
        .route("/health", get(handlers::health::basic_health))
}

/// Build the application router with state attached
pub fn create_router(state: AppState) -> Router {
    Router::new().nest("/api", api_routes()).with_state(state)
}
