//! End-to-end health cycles through the pipeline monitor.

mod common;

use axum::http::StatusCode;
use common::*;
use pipeline_monitor::config::ConfigManager;
use pipeline_monitor::constants::{AuditEventType, PipelineHealth};
use pipeline_monitor::health::{CheckDefinition, CheckDetail, CheckOutcome, NetworkProbeExecutor};
use pipeline_monitor::monitor::PipelineMonitor;
use pipeline_monitor::resilience::CircuitState;
use pipeline_monitor::scheduler::HealthScheduler;
use pipeline_monitor::services::{InMemoryAuditStore, InMemoryStatusStore, LogOnlyNotifier, ServiceBackends};
use pipeline_monitor::MonitorError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_scenario_all_checks_pass() {
    init_test_logging();
    let harness = TestHarness::new(
        monitor_config(http_checks(3), 5, 50, 15_000),
        ScriptedExecutor::healthy(),
    );

    harness.monitor.initialize().await.unwrap();
    let summary = harness.monitor.fire().await.unwrap();

    assert_eq!((summary.passed, summary.failed, summary.total), (3, 0, 3));
    assert_eq!(harness.monitor.circuit_state(), CircuitState::Closed);

    let history = harness.status_store.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, PipelineHealth::Ok);
    assert_eq!(history[0].circuit_state, CircuitState::Closed);
    assert_eq!(history[0].suggested_action, "No action needed");

    let startup = harness.audit_store.events_of(AuditEventType::Status);
    assert_eq!(startup.len(), 1);
    assert_eq!(startup[0].pipeline_name, PIPELINE);
}

#[tokio::test]
async fn test_scenario_http_500_fails_the_cycle() {
    let healthy = spawn_status_server(StatusCode::OK).await;
    let broken = spawn_status_server(StatusCode::INTERNAL_SERVER_ERROR).await;

    let status_store = Arc::new(InMemoryStatusStore::new());
    let services = ServiceBackends::new(
        status_store.clone(),
        Arc::new(InMemoryAuditStore::new()),
        Arc::new(LogOnlyNotifier),
    );
    let executor = Arc::new(NetworkProbeExecutor::new(
        reqwest::Client::new(),
        status_store,
        PIPELINE,
    ));
    let config = monitor_config(
        vec![
            CheckDefinition::http("ValidatorAPI", healthy, 1_000),
            CheckDefinition::http("RenderAPI", broken, 1_000),
            CheckDefinition::db_write("DBWrite", "pipeline_probe"),
        ]
        .into_iter()
        .map(|mut check| {
            check.timeout_ms = 1_000;
            check
        })
        .collect(),
        5,
        50,
        15_000,
    );
    let monitor = PipelineMonitor::with_components(Arc::new(config), services, executor);

    match monitor.fire().await.unwrap_err() {
        MonitorError::Aggregation(err) => {
            assert_eq!(err.summary.failed, 1);
            assert_eq!(err.summary.total, 3);
            let render = err
                .summary
                .details
                .iter()
                .find(|outcome| outcome.name() == "RenderAPI")
                .unwrap();
            match render {
                CheckOutcome::Completed(result) => {
                    assert!(!result.ok);
                    assert_eq!(result.detail, CheckDetail::Status(500));
                }
                other => panic!("expected completed result, got {other:?}"),
            }
        }
        other => panic!("expected aggregation failure, got {other:?}"),
    }

    // One failure is below the volume threshold
    assert_eq!(monitor.circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_scenario_open_then_recover_after_reset_timeout() {
    let harness = TestHarness::new(
        monitor_config(http_checks(2), 1, 1, 50),
        ScriptedExecutor::unhealthy(),
    );

    harness.monitor.fire().await.unwrap_err();
    assert_eq!(harness.monitor.circuit_state(), CircuitState::Open);
    let calls = harness.executor.calls();

    assert!(harness.monitor.fire().await.unwrap_err().is_circuit_open());
    assert_eq!(harness.executor.calls(), calls);

    sleep(Duration::from_millis(60)).await;
    harness.executor.set_healthy(true);

    harness.monitor.fire().await.unwrap();
    assert_eq!(harness.executor.calls(), calls + 2);
    assert_eq!(harness.monitor.circuit_state(), CircuitState::Closed);

    let status = harness.monitor.current_status().await.unwrap();
    assert_eq!(status.status, PipelineHealth::Ok);
    assert_eq!(status.editor_message, "Pipeline healthy");
}

#[tokio::test]
async fn test_breaker_timeout_counts_as_failure() {
    let executor = ScriptedExecutor::healthy();
    executor.set_delay(Duration::from_millis(300));
    let mut config = monitor_config(http_checks(1), 1, 1, 5_000);
    config.breaker.timeout_ms = 100;

    let harness = TestHarness::new(config, executor);
    match harness.monitor.fire().await.unwrap_err() {
        MonitorError::Timeout { timeout_ms, .. } => assert_eq!(timeout_ms, 100),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(harness.monitor.circuit_state(), CircuitState::Open);
    assert_eq!(harness.monitor.breaker_metrics().timeout_count, 1);
}

#[tokio::test]
async fn test_status_falls_back_to_initializing() {
    let harness = TestHarness::new(
        monitor_config(http_checks(1), 5, 50, 15_000),
        ScriptedExecutor::healthy(),
    );

    let status = harness.monitor.current_status().await.unwrap();
    assert_eq!(status.status, PipelineHealth::Unknown);
    assert_eq!(status.circuit_state, CircuitState::Closed);
    assert_eq!(status.suggested_action, "Await next health cycle");
    assert_eq!(status.editor_message, "Initializing");
}

#[tokio::test]
async fn test_status_read_failure_propagates_to_query_only() {
    let monitor = PipelineMonitor::with_components(
        Arc::new(monitor_config(http_checks(1), 5, 50, 15_000)),
        ServiceBackends::new(
            Arc::new(FailingStatusStore),
            Arc::new(InMemoryAuditStore::new()),
            Arc::new(LogOnlyNotifier),
        ),
        ScriptedExecutor::healthy(),
    );

    assert!(matches!(
        monitor.current_status().await,
        Err(MonitorError::Store(_))
    ));
    assert!(monitor.initialize().await.is_err());
    assert!(monitor.fire().await.is_ok());
}

#[tokio::test]
async fn test_from_config_with_memory_backends() {
    let healthy = spawn_status_server(StatusCode::OK).await;
    let mut config = monitor_config(
        vec![
            CheckDefinition::http("ValidatorAPI", healthy, 1_000),
            CheckDefinition::db_write("DBWrite", "pipeline_probe"),
        ],
        5,
        50,
        15_000,
    );
    config.checks[1].timeout_ms = 1_000;

    let monitor = PipelineMonitor::from_config(Arc::new(config)).await.unwrap();
    monitor.initialize().await.unwrap();

    let summary = monitor.fire().await.unwrap();
    assert_eq!(summary.passed, 2);

    let status = monitor.current_status().await.unwrap();
    assert_eq!(status.status, PipelineHealth::Ok);
    assert_eq!(status.pipeline, PIPELINE);
}

#[tokio::test]
async fn test_from_config_rejects_invalid_config() {
    let config = monitor_config(Vec::new(), 5, 50, 15_000);
    assert!(matches!(
        PipelineMonitor::from_config(Arc::new(config)).await,
        Err(MonitorError::Configuration(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_cycles_open_circuit_with_shipped_config() {
    init_test_logging();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/pipeline-monitor.toml");
    let manager = ConfigManager::load_from_path(&path).unwrap();
    let config = manager.config().clone();
    let interval = config.health_interval();
    let volume_threshold = config.breaker.volume_threshold;
    let checks = config.checks.len();

    let harness = TestHarness::new(config, ScriptedExecutor::unhealthy());
    let scheduler = HealthScheduler::new(Arc::clone(&harness.monitor), interval).spawn();

    // One cycle per interval; the first runs one interval after spawning
    sleep(interval * volume_threshold + interval / 2).await;
    scheduler.abort();

    assert_eq!(harness.monitor.circuit_state(), CircuitState::Open);
    assert_eq!(harness.executor.calls(), checks * volume_threshold as usize);
    assert_eq!(
        harness.audit_store.events_of(AuditEventType::FailureDetected).len(),
        1
    );
    assert_eq!(harness.monitor.breaker_metrics().window_samples, volume_threshold as usize);
}
