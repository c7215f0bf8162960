//! # Resilience Module
//!
//! Circuit breaker protecting the pipeline health cycle.
//!
//! ## Architecture
//!
//! - **Circuit Breaker**: three-state machine over a rolling outcome window
//! - **Status Reporter**: ordered transition hooks, injected at construction
//! - **Metrics Collection**: counters and window statistics per breaker
//! - **Health Circuit**: binds a breaker to the health aggregator
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_monitor::resilience::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let circuit_breaker =
//!     CircuitBreaker::without_reporter("ess-publishing", CircuitBreakerConfig::default());
//!
//! let result = circuit_breaker
//!     .call(|| async { Ok::<&str, std::io::Error>("success") })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod health_circuit;
pub mod metrics;
pub mod reporter;
pub mod rolling_window;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use config::CircuitBreakerConfig;
pub use health_circuit::HealthCircuit;
pub use metrics::CircuitBreakerMetrics;
pub use reporter::{NoopStatusReporter, StatusReporter, TransitionEvent};
pub use rolling_window::RollingWindow;
