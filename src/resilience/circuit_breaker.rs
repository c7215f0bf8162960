//! # Circuit Breaker Implementation
//!
//! Three-state breaker (Closed, Open, Half-Open) driven by a rolling window of
//! call outcomes. All state lives in one [`BreakerCore`] behind a single lock;
//! transitions are computed by plain functions on that core and then handed to
//! the injected [`StatusReporter`] in the order they happened.
//!
//! - Closed -> Open: the window holds at least `volume_threshold` outcomes and
//!   the failure percentage reaches `error_threshold_percentage`.
//! - Open -> Half-Open: `reset_timeout` after opening, driven by a timer, or by
//!   the first call made after the deadline if the timer has not fired yet.
//! - Half-Open -> Closed / Open: decided by exactly one trial call; concurrent
//!   calls are rejected while the trial is in flight.

use crate::constants::PipelineHealth;
use crate::resilience::{
    CircuitBreakerConfig, CircuitBreakerMetrics, NoopStatusReporter, RollingWindow,
    StatusReporter, TransitionEvent,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - a single trial call is allowed
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }

    /// Editor-facing health derived from the circuit state
    pub fn health(&self) -> PipelineHealth {
        match self {
            CircuitState::Closed => PipelineHealth::Ok,
            CircuitState::HalfOpen => PipelineHealth::Degraded,
            CircuitState::Open => PipelineHealth::Down,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CircuitState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLOSED" => Ok(CircuitState::Closed),
            "OPEN" => Ok(CircuitState::Open),
            "HALF_OPEN" => Ok(CircuitState::HalfOpen),
            other => Err(format!("unknown circuit state: {other}")),
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, the operation was not executed
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation failed and was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),

    /// Operation exceeded the breaker timeout and was recorded as a failure
    #[error("Operation timed out after {}ms for {component}", timeout.as_millis())]
    Timeout { component: String, timeout: Duration },
}

impl<E> CircuitBreakerError<E> {
    /// True when no operation ran at all
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::CircuitOpen { .. })
    }
}

#[derive(Debug, Default)]
struct AtomicCounters {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    timeout_count: AtomicU64,
    rejected_count: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

/// How a call was let through the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    /// The single Half-Open trial for the given generation
    Trial { generation: u64 },
    Rejected,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: CircuitState,
    to: CircuitState,
    generation: u64,
    window_samples: usize,
    window_failure_percentage: f64,
    forced: bool,
}

/// Mutable breaker state. Only ever touched under `BreakerInner::core`.
#[derive(Debug)]
struct BreakerCore {
    state: CircuitState,
    window: RollingWindow,
    opened_at: Option<Instant>,
    /// Bumped on every transition so stale trials and timers are ignored
    generation: u64,
    trial_in_flight: bool,
}

impl BreakerCore {
    fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            window: RollingWindow::new(config.rolling_window, config.max_window_samples),
            opened_at: None,
            generation: 0,
            trial_in_flight: false,
        }
    }

    fn transition(&mut self, to: CircuitState, now: Instant, forced: bool) -> Transition {
        self.window.prune(now);
        let transition = Transition {
            from: self.state,
            to,
            generation: self.generation + 1,
            window_samples: self.window.len(),
            window_failure_percentage: self.window.failure_percentage(),
            forced,
        };

        self.state = to;
        self.generation += 1;
        self.trial_in_flight = false;
        match to {
            CircuitState::Open => self.opened_at = Some(now),
            CircuitState::HalfOpen => {}
            CircuitState::Closed => {
                self.opened_at = None;
                self.window.clear();
            }
        }

        transition
    }

    fn half_open_due(&self, config: &CircuitBreakerConfig, now: Instant) -> bool {
        self.state == CircuitState::Open
            && self
                .opened_at
                .map_or(true, |at| now.saturating_duration_since(at) >= config.reset_timeout)
    }

    fn admit(
        &mut self,
        config: &CircuitBreakerConfig,
        now: Instant,
    ) -> (Admission, Option<Transition>) {
        match self.state {
            CircuitState::Closed => (Admission::Normal, None),
            CircuitState::HalfOpen => {
                if self.trial_in_flight {
                    (Admission::Rejected, None)
                } else {
                    self.trial_in_flight = true;
                    (
                        Admission::Trial {
                            generation: self.generation,
                        },
                        None,
                    )
                }
            }
            CircuitState::Open => {
                if !self.half_open_due(config, now) {
                    return (Admission::Rejected, None);
                }
                let transition = self.transition(CircuitState::HalfOpen, now, false);
                self.trial_in_flight = true;
                (
                    Admission::Trial {
                        generation: self.generation,
                    },
                    Some(transition),
                )
            }
        }
    }

    fn on_outcome(
        &mut self,
        outcome: Outcome,
        admission: Admission,
        config: &CircuitBreakerConfig,
        now: Instant,
    ) -> Option<Transition> {
        let success = outcome == Outcome::Success;
        self.window.record(now, success);

        match (self.state, admission) {
            (CircuitState::HalfOpen, Admission::Trial { generation })
                if generation == self.generation =>
            {
                let to = if success {
                    CircuitState::Closed
                } else {
                    CircuitState::Open
                };
                Some(self.transition(to, now, false))
            }
            (CircuitState::Closed, _) if !success => {
                let tripped = self.window.len() >= config.volume_threshold as usize
                    && self.window.failure_percentage()
                        >= f64::from(config.error_threshold_percentage);
                tripped.then(|| self.transition(CircuitState::Open, now, false))
            }
            _ => None,
        }
    }
}

struct BreakerInner {
    name: String,
    config: CircuitBreakerConfig,
    core: Mutex<BreakerCore>,
    /// Held while a transition is computed and reported, keeping reports ordered
    transitions: tokio::sync::Mutex<()>,
    reporter: Arc<dyn StatusReporter>,
    counters: AtomicCounters,
}

impl fmt::Debug for BreakerInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.core.lock().state)
            .finish()
    }
}

/// Releases a Half-Open trial slot if the trial call is dropped before its
/// outcome is recorded.
struct TrialGuard<'a> {
    inner: &'a BreakerInner,
    generation: Option<u64>,
}

impl<'a> TrialGuard<'a> {
    fn new(inner: &'a BreakerInner, admission: Admission) -> Self {
        let generation = match admission {
            Admission::Trial { generation } => Some(generation),
            _ => None,
        };
        Self { inner, generation }
    }

    fn disarm(&mut self) {
        self.generation = None;
    }
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if let Some(generation) = self.generation {
            let mut core = self.inner.core.lock();
            if core.state == CircuitState::HalfOpen && core.generation == generation {
                core.trial_in_flight = false;
            }
        }
    }
}

/// Circuit breaker with serialized state and ordered transition reporting.
///
/// Cloning is cheap; clones share the same state.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    inner: Arc<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker reporting transitions to `reporter`
    pub fn new(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        let name = name.into();
        info!(
            component = %name,
            timeout_ms = config.timeout.as_millis() as u64,
            error_threshold_percentage = config.error_threshold_percentage,
            volume_threshold = config.volume_threshold,
            reset_timeout_ms = config.reset_timeout.as_millis() as u64,
            "Circuit breaker initialized"
        );

        Self {
            inner: Arc::new(BreakerInner {
                name,
                core: Mutex::new(BreakerCore::new(&config)),
                config,
                transitions: tokio::sync::Mutex::new(()),
                reporter,
                counters: AtomicCounters::default(),
            }),
        }
    }

    /// Create a circuit breaker whose transitions are not reported anywhere
    pub fn without_reporter(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::new(name, config, Arc::new(NoopStatusReporter))
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        self.inner.core.lock().state
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.inner.config
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// While open, `operation` is never invoked. Otherwise it runs bounded by
    /// the configured timeout and its outcome feeds the rolling window.
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admit().await;
        if admission == Admission::Rejected {
            self.inner.counters.rejected_count.fetch_add(1, Ordering::Relaxed);
            debug!(
                component = %self.inner.name,
                state = %self.state(),
                "Call rejected without execution"
            );
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.inner.name.clone(),
            });
        }

        let mut trial = TrialGuard::new(&self.inner, admission);
        self.inner.counters.total_calls.fetch_add(1, Ordering::Relaxed);

        let start_time = Instant::now();
        let result = tokio::time::timeout(self.inner.config.timeout, operation()).await;
        let duration = start_time.elapsed();

        let (outcome, mapped) = match result {
            Ok(Ok(value)) => (Outcome::Success, Ok(value)),
            Ok(Err(e)) => (Outcome::Failure, Err(CircuitBreakerError::OperationFailed(e))),
            Err(_) => {
                self.inner.counters.timeout_count.fetch_add(1, Ordering::Relaxed);
                (
                    Outcome::Failure,
                    Err(CircuitBreakerError::Timeout {
                        component: self.inner.name.clone(),
                        timeout: self.inner.config.timeout,
                    }),
                )
            }
        };

        self.record(outcome, admission, duration).await;
        trial.disarm();

        mapped
    }

    async fn admit(&self) -> Admission {
        {
            let mut core = self.inner.core.lock();
            if !core.half_open_due(&self.inner.config, Instant::now()) {
                let (admission, _) = core.admit(&self.inner.config, Instant::now());
                return admission;
            }
        }

        // Open with an elapsed reset timeout: transition under the ordering lock
        let _order = self.inner.transitions.lock().await;
        let (admission, transition) = {
            let mut core = self.inner.core.lock();
            core.admit(&self.inner.config, Instant::now())
        };
        if let Some(transition) = transition {
            self.dispatch(transition).await;
        }
        admission
    }

    async fn record(&self, outcome: Outcome, admission: Admission, duration: Duration) {
        match outcome {
            Outcome::Success => {
                self.inner.counters.success_count.fetch_add(1, Ordering::Relaxed);
                debug!(
                    component = %self.inner.name,
                    duration_ms = duration.as_millis() as u64,
                    "Operation succeeded"
                );
            }
            Outcome::Failure => {
                self.inner.counters.failure_count.fetch_add(1, Ordering::Relaxed);
                warn!(
                    component = %self.inner.name,
                    duration_ms = duration.as_millis() as u64,
                    "Operation failed"
                );
            }
        }

        let _order = self.inner.transitions.lock().await;
        let transition = {
            let mut core = self.inner.core.lock();
            core.on_outcome(outcome, admission, &self.inner.config, Instant::now())
        };
        if let Some(transition) = transition {
            self.dispatch(transition).await;
        }
    }

    /// Log and report a transition. Callers hold the `transitions` lock.
    async fn dispatch(&self, transition: Transition) {
        let event = TransitionEvent {
            component: self.inner.name.clone(),
            from: transition.from,
            to: transition.to,
            window_samples: transition.window_samples,
            window_failure_percentage: transition.window_failure_percentage,
            forced: transition.forced,
            at: Utc::now(),
        };

        match transition.to {
            CircuitState::Open => {
                error!(
                    component = %self.inner.name,
                    from = %transition.from,
                    window_samples = transition.window_samples,
                    failure_percentage = transition.window_failure_percentage,
                    reset_timeout_ms = self.inner.config.reset_timeout.as_millis() as u64,
                    "Circuit breaker opened (failing fast)"
                );
                self.schedule_half_open(transition.generation);
                self.inner.reporter.on_open(&event).await;
            }
            CircuitState::HalfOpen => {
                info!(
                    component = %self.inner.name,
                    "Circuit breaker half-open (testing recovery)"
                );
                self.inner.reporter.on_half_open(&event).await;
            }
            CircuitState::Closed => {
                info!(
                    component = %self.inner.name,
                    from = %transition.from,
                    total_calls = self.inner.counters.total_calls.load(Ordering::Relaxed),
                    "Circuit breaker closed (recovered)"
                );
                self.inner.reporter.on_close(&event).await;
            }
        }
    }

    /// Move to Half-Open once `reset_timeout` has passed, without waiting for a call
    fn schedule_half_open(&self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                component = %self.inner.name,
                "No async runtime available; half-open will be evaluated on the next call"
            );
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.config.reset_timeout;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                CircuitBreaker { inner }.half_open_if_current(generation).await;
            }
        });
    }

    async fn half_open_if_current(&self, generation: u64) {
        let _order = self.inner.transitions.lock().await;
        let transition = {
            let mut core = self.inner.core.lock();
            (core.state == CircuitState::Open && core.generation == generation)
                .then(|| core.transition(CircuitState::HalfOpen, Instant::now(), false))
        };
        if let Some(transition) = transition {
            self.dispatch(transition).await;
        }
    }

    /// Force circuit to open state (for emergency situations)
    pub async fn force_open(&self) {
        warn!(component = %self.inner.name, "Circuit breaker forced open");
        self.force(CircuitState::Open).await;
    }

    /// Force circuit to closed state (for emergency recovery)
    pub async fn force_closed(&self) {
        warn!(component = %self.inner.name, "Circuit breaker forced closed");
        self.force(CircuitState::Closed).await;
    }

    async fn force(&self, to: CircuitState) {
        let _order = self.inner.transitions.lock().await;
        let transition = {
            let mut core = self.inner.core.lock();
            (core.state != to).then(|| core.transition(to, Instant::now(), true))
        };
        if let Some(transition) = transition {
            self.dispatch(transition).await;
        }
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let (current_state, window_samples, window_failure_percentage) = {
            let mut core = self.inner.core.lock();
            core.window.prune(Instant::now());
            (
                core.state,
                core.window.len(),
                core.window.failure_percentage(),
            )
        };
        let counters = &self.inner.counters;

        CircuitBreakerMetrics {
            current_state,
            total_calls: counters.total_calls.load(Ordering::Relaxed),
            success_count: counters.success_count.load(Ordering::Relaxed),
            failure_count: counters.failure_count.load(Ordering::Relaxed),
            timeout_count: counters.timeout_count.load(Ordering::Relaxed),
            rejected_count: counters.rejected_count.load(Ordering::Relaxed),
            window_samples,
            window_failure_percentage,
        }
    }
}
