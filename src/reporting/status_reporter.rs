//! Breaker transition hook writing status, audit and alerts.

use crate::constants::{AuditEventType, PipelineHealth};
use crate::logging::log_collaborator_failure;
use crate::models::PipelineStatus;
use crate::reporting::{AuditTrail, SinkMetrics};
use crate::resilience::{StatusReporter, TransitionEvent};
use crate::constants::DEFAULT_SINK_TIMEOUT_MS;
use crate::services::{Notifier, NotifyError, StatusStore, StoreError};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const ALERT_SUBJECT_DOWN: &str = "Publishing pipeline DOWN";
pub const ALERT_SUBJECT_RECOVERED: &str = "Publishing pipeline recovered";

/// Maps each breaker transition onto the collaborators:
///
/// | transition | status   | audit                | alert |
/// |------------|----------|----------------------|-------|
/// | OPEN       | DOWN     | `FAILURE_DETECTED`   | yes   |
/// | HALF_OPEN  | DEGRADED | `CIRCUIT_HALF_OPEN`  | no    |
/// | CLOSED     | OK       | `RECOVERY_SUCCEEDED` | yes   |
///
/// Hooks run while the breaker holds its transition lock, so every status
/// write and alert is bounded by `timeout`.
pub struct PipelineStatusReporter {
    pipeline_name: String,
    status_store: Arc<dyn StatusStore>,
    audit: AuditTrail,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<SinkMetrics>,
    timeout: Duration,
}

impl PipelineStatusReporter {
    pub fn new(
        pipeline_name: impl Into<String>,
        status_store: Arc<dyn StatusStore>,
        audit: AuditTrail,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<SinkMetrics>,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            status_store,
            audit,
            notifier,
            metrics,
            timeout: Duration::from_millis(DEFAULT_SINK_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn timed_out(&self, operation: &str) -> String {
        format!("{operation} timed out after {}ms", self.timeout.as_millis())
    }

    async fn write_status(&self, health: PipelineHealth, event: &TransitionEvent) {
        let status = PipelineStatus::for_state(
            &self.pipeline_name,
            health,
            event.to,
            transition_detail(event),
        );

        let result = tokio::time::timeout(self.timeout, self.status_store.write_status(&status))
            .await
            .unwrap_or_else(|_| Err(StoreError::Unavailable(self.timed_out("status write"))));

        match result {
            Ok(()) => {
                self.metrics.record_status_write(true);
                info!(
                    pipeline = %self.pipeline_name,
                    status = %health,
                    state = %event.to,
                    "Pipeline status updated"
                );
            }
            Err(e) => {
                self.metrics.record_status_write(false);
                log_collaborator_failure(
                    "status_store",
                    "write_status",
                    &self.pipeline_name,
                    &e.to_string(),
                );
            }
        }
    }

    async fn alert(&self, subject: &str, message: String) {
        let result = tokio::time::timeout(self.timeout, self.notifier.send_alert(subject, &message))
            .await
            .unwrap_or_else(|_| Err(NotifyError::Unavailable(self.timed_out("alert"))));

        match result {
            Ok(()) => self.metrics.record_alert(true),
            Err(e) => {
                self.metrics.record_alert(false);
                log_collaborator_failure("notifier", subject, &self.pipeline_name, &e.to_string());
            }
        }
    }
}

fn transition_detail(event: &TransitionEvent) -> serde_json::Value {
    json!({
        "from": event.from,
        "to": event.to,
        "windowSamples": event.window_samples,
        "windowFailurePercentage": event.window_failure_percentage,
        "forced": event.forced,
        "at": event.at,
    })
}

#[async_trait]
impl StatusReporter for PipelineStatusReporter {
    async fn on_open(&self, event: &TransitionEvent) {
        self.write_status(PipelineHealth::Down, event).await;
        self.audit
            .record(AuditEventType::FailureDetected, transition_detail(event))
            .await;
        self.alert(
            ALERT_SUBJECT_DOWN,
            format!(
                "Circuit OPEN for {} at {}",
                self.pipeline_name,
                event.at.to_rfc3339()
            ),
        )
        .await;
    }

    async fn on_half_open(&self, event: &TransitionEvent) {
        self.write_status(PipelineHealth::Degraded, event).await;
        self.audit
            .record(AuditEventType::CircuitHalfOpen, transition_detail(event))
            .await;
    }

    async fn on_close(&self, event: &TransitionEvent) {
        self.write_status(PipelineHealth::Ok, event).await;
        self.audit
            .record(AuditEventType::RecoverySucceeded, transition_detail(event))
            .await;
        self.alert(
            ALERT_SUBJECT_RECOVERED,
            format!(
                "Circuit CLOSED for {} at {}",
                self.pipeline_name,
                event.at.to_rfc3339()
            ),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;
    use crate::services::{InMemoryAuditStore, InMemoryNotifier, InMemoryStatusStore};
    use chrono::Utc;

    fn event(from: CircuitState, to: CircuitState) -> TransitionEvent {
        TransitionEvent {
            component: "ess-publishing".to_string(),
            from,
            to,
            window_samples: 5,
            window_failure_percentage: 100.0,
            forced: false,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_open_writes_down_audits_and_alerts() {
        let status_store = Arc::new(InMemoryStatusStore::new());
        let audit_store = Arc::new(InMemoryAuditStore::new());
        let notifier = Arc::new(InMemoryNotifier::new());
        let metrics = Arc::new(SinkMetrics::default());
        let reporter = PipelineStatusReporter::new(
            "ess-publishing",
            status_store.clone(),
            AuditTrail::new(audit_store.clone(), "ess-publishing", 7, metrics.clone()),
            notifier.clone(),
            metrics.clone(),
        );

        reporter
            .on_open(&event(CircuitState::Closed, CircuitState::Open))
            .await;
        reporter
            .on_half_open(&event(CircuitState::Open, CircuitState::HalfOpen))
            .await;

        let history = status_store.history();
        assert_eq!(history[0].status, PipelineHealth::Down);
        assert_eq!(history[0].circuit_state, CircuitState::Open);
        assert_eq!(history[1].status, PipelineHealth::Degraded);

        assert_eq!(audit_store.events_of(AuditEventType::FailureDetected).len(), 1);
        assert_eq!(audit_store.events_of(AuditEventType::CircuitHalfOpen).len(), 1);

        // Half-open does not alert
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, ALERT_SUBJECT_DOWN);
        assert!(sent[0].message.starts_with("Circuit OPEN for ess-publishing at "));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.status_writes, 2);
        assert_eq!(snapshot.audit_writes, 2);
        assert_eq!(snapshot.alerts_sent, 1);
    }

    /// Status store that never answers
    struct StalledStatusStore;

    #[async_trait]
    impl StatusStore for StalledStatusStore {
        async fn write_status(&self, _status: &PipelineStatus) -> crate::services::StoreResult<()> {
            std::future::pending().await
        }

        async fn read_status(
            &self,
            _pipeline: &str,
        ) -> crate::services::StoreResult<Option<PipelineStatus>> {
            std::future::pending().await
        }

        async fn write_marker(
            &self,
            _table: &str,
            _marker: &crate::models::ProbeMarker,
        ) -> crate::services::StoreResult<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_status_store_is_bounded_by_timeout() {
        let audit_store = Arc::new(InMemoryAuditStore::new());
        let notifier = Arc::new(InMemoryNotifier::new());
        let metrics = Arc::new(SinkMetrics::default());
        let reporter = PipelineStatusReporter::new(
            "ess-publishing",
            Arc::new(StalledStatusStore),
            AuditTrail::new(audit_store.clone(), "ess-publishing", 7, metrics.clone()),
            notifier.clone(),
            metrics.clone(),
        )
        .with_timeout(Duration::from_millis(250));

        let started = tokio::time::Instant::now();
        reporter
            .on_open(&event(CircuitState::Closed, CircuitState::Open))
            .await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(audit_store.events_of(AuditEventType::FailureDetected).len(), 1);
        assert_eq!(notifier.sent().len(), 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.status_write_failures, 1);
        assert_eq!(snapshot.status_writes, 0);
    }
}
