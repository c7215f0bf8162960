//! # Probe Executors
//!
//! Single-unit verifications of one dependency. Every probe folds its own
//! failures into a [`CheckResult`] with `ok = false`; nothing here returns an
//! error to the caller.

use crate::constants::DB_WRITE_OK;
use crate::health::{CheckDefinition, CheckKind, CheckResult};
use crate::models::ProbeMarker;
use crate::services::StatusStore;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Dispatches a check definition to the probe that verifies it
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    async fn execute(&self, check: &CheckDefinition) -> CheckResult;
}

/// Probe executor backed by a shared HTTP client and the configured marker store
#[derive(Clone)]
pub struct NetworkProbeExecutor {
    client: Client,
    marker_store: Arc<dyn StatusStore>,
    pipeline_name: String,
}

impl std::fmt::Debug for NetworkProbeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkProbeExecutor")
            .field("pipeline_name", &self.pipeline_name)
            .finish()
    }
}

impl NetworkProbeExecutor {
    pub fn new(
        client: Client,
        marker_store: Arc<dyn StatusStore>,
        pipeline_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            marker_store,
            pipeline_name: pipeline_name.into(),
        }
    }
}

#[async_trait]
impl ProbeExecutor for NetworkProbeExecutor {
    async fn execute(&self, check: &CheckDefinition) -> CheckResult {
        let result = match check.kind {
            CheckKind::Http => {
                probe_reachability(
                    &self.client,
                    &check.name,
                    &check.target,
                    &check.method,
                    Duration::from_millis(check.timeout_ms),
                )
                .await
            }
            CheckKind::DbWrite => {
                probe_write_capability(
                    self.marker_store.as_ref(),
                    &check.name,
                    &self.pipeline_name,
                    &check.target,
                )
                .await
            }
        };

        debug!(
            pipeline = %self.pipeline_name,
            check = %result.name,
            ok = result.ok,
            detail = %result.detail,
            elapsed_ms = result.elapsed_ms,
            "Probe completed"
        );
        result
    }
}

/// Issue one request against `target`; any 2xx status passes
pub async fn probe_reachability(
    client: &Client,
    name: &str,
    target: &str,
    method: &str,
    timeout: Duration,
) -> CheckResult {
    if target.trim().is_empty() {
        return CheckResult::failed(name, "no target url configured", 0);
    }
    let Ok(method) = Method::from_bytes(method.as_bytes()) else {
        return CheckResult::failed(name, format!("invalid http method: {method}"), 0);
    };

    let start = Instant::now();
    let response = client.request(method, target).timeout(timeout).send().await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match response {
        Ok(response) if response.status().is_success() => {
            CheckResult::passed(name, response.status().as_u16(), elapsed_ms)
        }
        Ok(response) => CheckResult::failed(name, response.status().as_u16(), elapsed_ms),
        Err(e) if e.is_timeout() => CheckResult::failed(
            name,
            format!("timeout of {}ms exceeded", timeout.as_millis()),
            elapsed_ms,
        ),
        Err(e) => CheckResult::failed(name, e.to_string(), elapsed_ms),
    }
}

/// Write a marker record to `table`; the marker is left in place
pub async fn probe_write_capability(
    store: &dyn StatusStore,
    name: &str,
    pipeline_name: &str,
    table: &str,
) -> CheckResult {
    let start = Instant::now();
    let marker = ProbeMarker::new(pipeline_name);
    let written = store.write_marker(table, &marker).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match written {
        Ok(()) => CheckResult::passed(name, DB_WRITE_OK, elapsed_ms),
        Err(e) => CheckResult::failed(name, e.to_string(), elapsed_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::CheckDetail;
    use crate::services::InMemoryStatusStore;

    #[tokio::test]
    async fn test_empty_target_fails_without_request() {
        let result =
            probe_reachability(&Client::new(), "Validator", "", "GET", Duration::from_secs(1)).await;
        assert!(!result.ok);
        assert_eq!(result.detail, CheckDetail::from("no target url configured"));
    }

    #[tokio::test]
    async fn test_invalid_method_fails() {
        let result = probe_reachability(
            &Client::new(),
            "Validator",
            "http://127.0.0.1:9/health",
            "NOT A METHOD",
            Duration::from_secs(1),
        )
        .await;
        assert!(!result.ok);
        assert!(result.detail.to_string().contains("invalid http method"));
    }

    #[tokio::test]
    async fn test_unreachable_target_fails_with_message() {
        // Port 9 (discard) is not expected to accept connections locally
        let result = probe_reachability(
            &Client::new(),
            "Validator",
            "http://127.0.0.1:9/health",
            "GET",
            Duration::from_millis(500),
        )
        .await;
        assert!(!result.ok);
        assert!(matches!(result.detail, CheckDetail::Message(_)));
    }

    #[tokio::test]
    async fn test_write_probe_leaves_marker() {
        let store = InMemoryStatusStore::new();
        let result = probe_write_capability(&store, "DBWrite", "ess-publishing", "pipeline_probe").await;

        assert!(result.ok);
        assert_eq!(result.detail, CheckDetail::from(DB_WRITE_OK));
        assert_eq!(store.marker_count("pipeline_probe"), 1);
    }
}
