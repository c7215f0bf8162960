use crate::constants::{AuditEventType, DEFAULT_SINK_TIMEOUT_MS};
use crate::logging::log_collaborator_failure;
use crate::models::AuditEvent;
use crate::reporting::SinkMetrics;
use crate::services::{AuditStore, StoreError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Best-effort audit writer for one pipeline
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn AuditStore>,
    pipeline_name: String,
    ttl_days: u32,
    metrics: Arc<SinkMetrics>,
    timeout: Duration,
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail")
            .field("pipeline_name", &self.pipeline_name)
            .field("ttl_days", &self.ttl_days)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AuditTrail {
    pub fn new(
        store: Arc<dyn AuditStore>,
        pipeline_name: impl Into<String>,
        ttl_days: u32,
        metrics: Arc<SinkMetrics>,
    ) -> Self {
        Self {
            store,
            pipeline_name: pipeline_name.into(),
            ttl_days,
            metrics,
            timeout: Duration::from_millis(DEFAULT_SINK_TIMEOUT_MS),
        }
    }

    /// Bound each append by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Append one event; a store failure or timeout is logged and counted
    pub async fn record(&self, event_type: AuditEventType, detail: Value) {
        let event = AuditEvent::new(&self.pipeline_name, event_type, detail, self.ttl_days);

        let result = tokio::time::timeout(self.timeout, self.store.append(&event))
            .await
            .unwrap_or_else(|_| {
                Err(StoreError::Unavailable(format!(
                    "append timed out after {}ms",
                    self.timeout.as_millis()
                )))
            });

        match result {
            Ok(()) => {
                self.metrics.record_audit_write(true);
                debug!(
                    pipeline = %self.pipeline_name,
                    event_type = %event_type,
                    event_id = %event.id,
                    "Audit event recorded"
                );
            }
            Err(e) => {
                self.metrics.record_audit_write(false);
                log_collaborator_failure(
                    "audit_store",
                    event_type.as_str(),
                    &self.pipeline_name,
                    &e.to_string(),
                );
            }
        }
    }
}
