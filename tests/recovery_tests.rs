//! Recovery attempts: audit sequence, coalescing and breaker independence.

mod common;

use common::*;
use pipeline_monitor::constants::AuditEventType;
use pipeline_monitor::resilience::CircuitState;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_failing_warm_up_does_not_block_recovery() {
    init_test_logging();
    let mut config = monitor_config(http_checks(2), 5, 50, 15_000);
    config.warm_up_url = Some("http://validator.internal/warm".to_string());
    let executor = ScriptedExecutor::healthy();
    executor.fail_check("warm-up");

    let harness = TestHarness::new(config, executor);
    let outcome = harness.monitor.attempt_recovery(Some("editor escalation")).await;

    assert!(outcome.ok);
    assert_eq!(outcome.result.as_ref().unwrap().passed, 2);
    assert!(outcome.error.is_none());

    // Warm-up ran first, then the configured checks
    assert_eq!(harness.executor.executed()[0], "warm-up");
    assert_eq!(harness.executor.calls(), 3);

    let events = harness.audit_store.events();
    let types: Vec<_> = events.iter().map(|event| event.event_type).collect();
    assert_eq!(
        types,
        vec![AuditEventType::RecoveryAttempt, AuditEventType::RecoverySucceeded]
    );
    assert_eq!(events[0].detail["reason"], "editor escalation");
}

#[tokio::test]
async fn test_recovery_failure_is_reported() {
    let harness = TestHarness::new(
        monitor_config(http_checks(3), 5, 50, 15_000),
        ScriptedExecutor::healthy(),
    );
    harness.executor.fail_check("check-1");

    let outcome = harness.monitor.attempt_recovery(None).await;

    assert!(!outcome.ok);
    assert!(outcome.result.is_none());
    assert_eq!(outcome.error.as_deref(), Some("Health failed: 1/3 checks"));

    let attempts = harness.audit_store.events_of(AuditEventType::RecoveryAttempt);
    assert_eq!(attempts[0].detail["reason"], "manual");
    let failures = harness.audit_store.events_of(AuditEventType::RecoveryFailed);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].detail["error"], "Health failed: 1/3 checks");
}

#[tokio::test]
async fn test_repeated_recovery_never_touches_breaker() {
    let harness = TestHarness::new(
        monitor_config(http_checks(2), 1, 1, 60_000),
        ScriptedExecutor::unhealthy(),
    );

    harness.monitor.fire().await.unwrap_err();
    assert_eq!(harness.monitor.circuit_state(), CircuitState::Open);
    let before = harness.monitor.breaker_metrics();

    harness.executor.set_healthy(true);
    for _ in 0..5 {
        assert!(harness.monitor.attempt_recovery(Some("retry")).await.ok);
        assert_eq!(harness.monitor.circuit_state(), CircuitState::Open);
    }

    let after = harness.monitor.breaker_metrics();
    assert_eq!(after.total_calls, before.total_calls);
    assert_eq!(after.rejected_count, before.rejected_count);

    // No transition was reported beyond the original open
    assert_eq!(harness.status_store.history().len(), 1);
}

#[tokio::test]
async fn test_recovery_with_healthy_aggregator_is_idempotent() {
    let harness = TestHarness::new(
        monitor_config(http_checks(2), 5, 50, 15_000),
        ScriptedExecutor::healthy(),
    );

    for _ in 0..3 {
        let outcome = harness.monitor.attempt_recovery(None).await;
        assert!(outcome.ok);
        assert_eq!(harness.monitor.circuit_state(), CircuitState::Closed);
    }
    assert_eq!(
        harness
            .audit_store
            .events_of(AuditEventType::RecoverySucceeded)
            .len(),
        3
    );
}

#[tokio::test]
async fn test_concurrent_recovery_requests_are_coalesced() {
    let executor = ScriptedExecutor::healthy();
    executor.set_delay(Duration::from_millis(50));
    let harness = TestHarness::new(monitor_config(http_checks(2), 5, 50, 15_000), executor);

    let attempts = (0..4).map(|i| {
        let monitor = Arc::clone(&harness.monitor);
        tokio::spawn(async move { monitor.attempt_recovery(Some(&format!("caller-{i}"))).await })
    });
    let outcomes = futures::future::join_all(attempts).await;

    for outcome in outcomes {
        assert!(outcome.unwrap().ok);
    }
    assert_eq!(harness.executor.calls(), 2);
    assert_eq!(
        harness
            .audit_store
            .events_of(AuditEventType::RecoveryAttempt)
            .len(),
        1
    );
}
