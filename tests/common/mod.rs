//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use pipeline_monitor::config::{BreakerSettings, MonitorConfig};
use pipeline_monitor::health::{CheckDefinition, CheckResult, ProbeExecutor};
use pipeline_monitor::models::{AuditEvent, PipelineStatus, ProbeMarker};
use pipeline_monitor::monitor::PipelineMonitor;
use pipeline_monitor::services::{
    AuditStore, InMemoryAuditStore, InMemoryNotifier, InMemoryStatusStore, Notifier, NotifyError,
    ServiceBackends, StatusStore, StoreError, StoreResult,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const PIPELINE: &str = "ess-publishing";

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pipeline_monitor=debug")
        .with_test_writer()
        .try_init();
}

/// Probe executor with scripted results.
///
/// Every check passes with status 200 unless the executor is marked unhealthy
/// or the check name is in the failing set. Calls are counted per executor.
#[derive(Default)]
pub struct ScriptedExecutor {
    unhealthy: AtomicBool,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    executed: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedExecutor {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unhealthy() -> Arc<Self> {
        let executor = Self::default();
        executor.unhealthy.store(true, Ordering::SeqCst);
        Arc::new(executor)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    /// Make every probe take `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn fail_check(&self, name: &str) {
        self.failing.lock().insert(name.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl ProbeExecutor for ScriptedExecutor {
    async fn execute(&self, check: &CheckDefinition) -> CheckResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().push(check.name.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.unhealthy.load(Ordering::SeqCst) || self.failing.lock().contains(&check.name) {
            CheckResult::failed(&check.name, 503u16, 1)
        } else {
            CheckResult::passed(&check.name, 200u16, 1)
        }
    }
}

/// Status store whose every operation fails
#[derive(Debug, Default)]
pub struct FailingStatusStore;

#[async_trait]
impl StatusStore for FailingStatusStore {
    async fn write_status(&self, _status: &PipelineStatus) -> StoreResult<()> {
        Err(StoreError::Unavailable("status table offline".to_string()))
    }

    async fn read_status(&self, _pipeline: &str) -> StoreResult<Option<PipelineStatus>> {
        Err(StoreError::Unavailable("status table offline".to_string()))
    }

    async fn write_marker(&self, _table: &str, _marker: &ProbeMarker) -> StoreResult<()> {
        Err(StoreError::Unavailable("status table offline".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn append(&self, _event: &AuditEvent) -> StoreResult<()> {
        Err(StoreError::Unavailable("audit table offline".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_alert(&self, _subject: &str, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("webhook rejected".to_string()))
    }
}

pub fn http_checks(count: usize) -> Vec<CheckDefinition> {
    (0..count)
        .map(|i| CheckDefinition::http(format!("check-{i}"), format!("http://svc-{i}/health"), 200))
        .collect()
}

pub fn monitor_config(
    checks: Vec<CheckDefinition>,
    volume_threshold: u32,
    error_threshold_percentage: u8,
    reset_timeout_ms: u64,
) -> MonitorConfig {
    let mut config = MonitorConfig::for_pipeline(PIPELINE);
    config.checks = checks;
    config.breaker = BreakerSettings {
        timeout_ms: 1_000,
        error_threshold_percentage,
        volume_threshold,
        reset_timeout_ms,
        ..BreakerSettings::default()
    };
    config
}

/// A monitor wired to in-memory collaborators the test can inspect
pub struct TestHarness {
    pub monitor: Arc<PipelineMonitor>,
    pub executor: Arc<ScriptedExecutor>,
    pub status_store: Arc<InMemoryStatusStore>,
    pub audit_store: Arc<InMemoryAuditStore>,
    pub notifier: Arc<InMemoryNotifier>,
}

impl TestHarness {
    pub fn new(config: MonitorConfig, executor: Arc<ScriptedExecutor>) -> Self {
        let status_store = Arc::new(InMemoryStatusStore::new());
        let audit_store = Arc::new(InMemoryAuditStore::new());
        let notifier = Arc::new(InMemoryNotifier::new());
        let services = ServiceBackends::new(
            status_store.clone(),
            audit_store.clone(),
            notifier.clone(),
        );

        let monitor = Arc::new(PipelineMonitor::with_components(
            Arc::new(config),
            services,
            executor.clone(),
        ));

        Self {
            monitor,
            executor,
            status_store,
            audit_store,
            notifier,
        }
    }
}

/// Serve `status` on `GET /health` from an ephemeral local port
pub async fn spawn_status_server(status: StatusCode) -> String {
    let app = Router::new().route("/health", get(move || async move { status }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/health")
}

/// Serve `GET /health` that answers only after `delay`
pub async fn spawn_slow_server(delay: Duration) -> String {
    let app = Router::new().route(
        "/health",
        get(move || async move {
            tokio::time::sleep(delay).await;
            StatusCode::OK
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/health")
}
