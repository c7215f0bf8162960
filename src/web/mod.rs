//! # Web API
//!
//! Axum routes exposing the monitor's operation surface. Handlers read
//! through [`crate::monitor::PipelineMonitor`] only; the breaker is never
//! mutated from here.

pub mod handlers;
pub mod response_types;
pub mod routes;
pub mod state;

pub use response_types::ApiError;
pub use routes::create_router;
pub use state::AppState;
