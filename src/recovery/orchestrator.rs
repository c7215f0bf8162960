use crate::constants::{
    AuditEventType, DEFAULT_RECOVERY_REASON, WARM_UP_CHECK_NAME, WARM_UP_TIMEOUT_MS,
};
use crate::health::{AggregateSummary, CheckDefinition, HealthAggregator};
use crate::reporting::AuditTrail;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of one recovery attempt; reflected into the audit log and the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AggregateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecoveryOutcome {
    pub fn succeeded(result: AggregateSummary) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

type SharedOutcome = Shared<BoxFuture<'static, RecoveryOutcome>>;

struct RecoveryInner {
    pipeline_name: String,
    aggregator: Arc<HealthAggregator>,
    audit: AuditTrail,
    warm_up_url: Option<String>,
    in_flight: Mutex<Option<SharedOutcome>>,
}

/// Sequential recovery workflow with coalescing of concurrent requests.
///
/// A request arriving while an attempt is running joins that attempt and
/// receives its outcome; its own reason is not recorded.
#[derive(Clone)]
pub struct RecoveryOrchestrator {
    inner: Arc<RecoveryInner>,
}

impl std::fmt::Debug for RecoveryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryOrchestrator")
            .field("pipeline_name", &self.inner.pipeline_name)
            .field("warm_up_url", &self.inner.warm_up_url)
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

impl RecoveryOrchestrator {
    pub fn new(
        pipeline_name: impl Into<String>,
        aggregator: Arc<HealthAggregator>,
        audit: AuditTrail,
        warm_up_url: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(RecoveryInner {
                pipeline_name: pipeline_name.into(),
                aggregator,
                audit,
                warm_up_url,
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// Attempt recovery. A blank or missing reason is recorded as `"manual"`.
    pub async fn attempt_recovery(&self, reason: Option<&str>) -> RecoveryOutcome {
        let attempt = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some(running) => {
                    debug!(
                        pipeline = %self.inner.pipeline_name,
                        "Joining in-flight recovery attempt"
                    );
                    running.clone()
                }
                None => {
                    let reason = reason
                        .map(str::trim)
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or(DEFAULT_RECOVERY_REASON)
                        .to_string();
                    let attempt = self.start(reason);
                    *slot = Some(attempt.clone());
                    attempt
                }
            }
        };

        attempt.await
    }

    /// Spawn the attempt so it completes even if every caller goes away.
    /// Called with the `in_flight` slot locked.
    fn start(&self, reason: String) -> SharedOutcome {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let outcome = inner.run(reason).await;
            *inner.in_flight.lock() = None;
            outcome
        });

        let pipeline_name = self.inner.pipeline_name.clone();
        let weak = Arc::downgrade(&self.inner);
        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(pipeline = %pipeline_name, error = %e, "Recovery task aborted");
                    if let Some(inner) = weak.upgrade() {
                        *inner.in_flight.lock() = None;
                    }
                    RecoveryOutcome::failed(format!("Recovery task aborted: {e}"))
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl RecoveryInner {
    async fn run(&self, reason: String) -> RecoveryOutcome {
        info!(pipeline = %self.pipeline_name, reason = %reason, "Recovery attempt started");
        self.audit
            .record(
                AuditEventType::RecoveryAttempt,
                json!({ "reason": reason, "at": Utc::now() }),
            )
            .await;

        if let Some(url) = &self.warm_up_url {
            self.warm_up(url).await;
        }

        match self.aggregator.aggregate_configured().await {
            Ok(summary) => {
                info!(
                    pipeline = %self.pipeline_name,
                    passed = summary.passed,
                    total = summary.total,
                    "Recovery attempt succeeded"
                );
                self.audit
                    .record(AuditEventType::RecoverySucceeded, json!({ "result": summary }))
                    .await;
                RecoveryOutcome::succeeded(summary)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(
                    pipeline = %self.pipeline_name,
                    error = %message,
                    failed_checks = ?err.summary.failed_checks(),
                    "Recovery attempt failed"
                );
                self.audit
                    .record(
                        AuditEventType::RecoveryFailed,
                        json!({ "error": message, "summary": err.summary }),
                    )
                    .await;
                RecoveryOutcome::failed(message)
            }
        }
    }

    /// Best-effort request against the warm-up target; the outcome is only logged
    async fn warm_up(&self, url: &str) {
        let check = CheckDefinition::http(WARM_UP_CHECK_NAME, url, WARM_UP_TIMEOUT_MS);
        let probe = self.aggregator.executor().execute(&check);

        match tokio::time::timeout(Duration::from_millis(WARM_UP_TIMEOUT_MS), probe).await {
            Ok(result) if result.ok => {
                info!(
                    pipeline = %self.pipeline_name,
                    detail = %result.detail,
                    elapsed_ms = result.elapsed_ms,
                    "Warm-up probe succeeded"
                );
            }
            Ok(result) => {
                warn!(
                    pipeline = %self.pipeline_name,
                    error = %result.detail,
                    "Warm-up probe failed - continuing recovery"
                );
            }
            Err(_) => {
                warn!(
                    pipeline = %self.pipeline_name,
                    timeout_ms = WARM_UP_TIMEOUT_MS,
                    "Warm-up probe timed out - continuing recovery"
                );
            }
        }
    }
}
