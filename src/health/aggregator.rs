//! # Health Aggregator
//!
//! Fans the configured checks out concurrently, waits for all of them, and
//! reduces the outcomes into one [`AggregateSummary`].

use crate::health::{
    AggregateSummary, AggregationError, CheckDefinition, CheckOutcome, CheckResult, ProbeExecutor,
};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct HealthAggregator {
    pipeline_name: String,
    checks: Arc<[CheckDefinition]>,
    executor: Arc<dyn ProbeExecutor>,
}

impl fmt::Debug for HealthAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthAggregator")
            .field("pipeline_name", &self.pipeline_name)
            .field("checks", &self.checks.len())
            .finish()
    }
}

impl HealthAggregator {
    pub fn new(
        pipeline_name: impl Into<String>,
        checks: Vec<CheckDefinition>,
        executor: Arc<dyn ProbeExecutor>,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            checks: checks.into(),
            executor,
        }
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    pub fn checks(&self) -> &[CheckDefinition] {
        &self.checks
    }

    pub fn executor(&self) -> &Arc<dyn ProbeExecutor> {
        &self.executor
    }

    /// Aggregate the checks fixed at construction
    pub async fn aggregate_configured(&self) -> Result<AggregateSummary, AggregationError> {
        self.aggregate(&self.checks).await
    }

    /// Run every check concurrently and fail if any of them failed.
    ///
    /// Details keep the order of `checks`. There is no short-circuit: a slow
    /// check is bounded only by its own timeout.
    pub async fn aggregate(
        &self,
        checks: &[CheckDefinition],
    ) -> Result<AggregateSummary, AggregationError> {
        let start = Instant::now();
        let details = join_all(checks.iter().map(|check| self.run_check(check))).await;
        let summary = AggregateSummary::from_outcomes(&self.pipeline_name, details);

        if summary.is_healthy() {
            debug!(
                pipeline = %self.pipeline_name,
                total = summary.total,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Health aggregation passed"
            );
            Ok(summary)
        } else {
            warn!(
                pipeline = %self.pipeline_name,
                failed = summary.failed,
                total = summary.total,
                failed_checks = ?summary.failed_checks(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Health aggregation failed"
            );
            Err(AggregationError { summary })
        }
    }

    async fn run_check(&self, check: &CheckDefinition) -> CheckOutcome {
        let probe = AssertUnwindSafe(self.executor.execute(check)).catch_unwind();

        match tokio::time::timeout(Duration::from_millis(check.timeout_ms), probe).await {
            Ok(Ok(mut result)) => {
                result.name.clone_from(&check.name);
                CheckOutcome::Completed(result)
            }
            Ok(Err(panic)) => {
                let reason = panic_reason(panic.as_ref());
                warn!(
                    pipeline = %self.pipeline_name,
                    check = %check.name,
                    error = %reason,
                    "Probe faulted"
                );
                CheckOutcome::Rejected {
                    name: check.name.clone(),
                    reason,
                }
            }
            Err(_) => CheckOutcome::Completed(CheckResult::failed(
                &check.name,
                format!("timed out after {}ms", check.timeout_ms),
                check.timeout_ms,
            )),
        }
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("probe panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("probe panicked: {msg}")
    } else {
        "probe panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Passes every check whose name does not start with "bad"
    struct NameBasedExecutor;

    #[async_trait]
    impl ProbeExecutor for NameBasedExecutor {
        async fn execute(&self, check: &CheckDefinition) -> CheckResult {
            match check.name.as_str() {
                name if name.starts_with("bad") => CheckResult::failed(name, 500u16, 1),
                "panics" => panic!("boom"),
                "hangs" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    CheckResult::passed("hangs", 200u16, 5_000)
                }
                name => CheckResult::passed(name, 200u16, 1),
            }
        }
    }

    fn aggregator() -> HealthAggregator {
        HealthAggregator::new("ess-publishing", Vec::new(), Arc::new(NameBasedExecutor))
    }

    fn check(name: &str) -> CheckDefinition {
        CheckDefinition::http(name, "http://unused", 100)
    }

    #[tokio::test]
    async fn test_all_passing() {
        let summary = aggregator()
            .aggregate(&[check("a"), check("b")])
            .await
            .unwrap();
        assert_eq!((summary.passed, summary.failed, summary.total), (2, 0, 2));
    }

    #[tokio::test]
    async fn test_failure_carries_summary_in_order() {
        let err = aggregator()
            .aggregate(&[check("a"), check("bad-b"), check("c")])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Health failed: 1/3 checks");
        let names: Vec<_> = err.summary.details.iter().map(CheckOutcome::name).collect();
        assert_eq!(names, vec!["a", "bad-b", "c"]);
    }

    #[tokio::test]
    async fn test_panicking_probe_is_rejected() {
        let err = aggregator()
            .aggregate(&[check("a"), check("panics")])
            .await
            .unwrap_err();

        match &err.summary.details[1] {
            CheckOutcome::Rejected { name, reason } => {
                assert_eq!(name, "panics");
                assert!(reason.contains("boom"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hanging_probe_times_out() {
        let err = aggregator()
            .aggregate(&[check("hangs")])
            .await
            .unwrap_err();

        match &err.summary.details[0] {
            CheckOutcome::Completed(result) => {
                assert!(!result.ok);
                assert_eq!(result.detail.to_string(), "timed out after 100ms");
            }
            other => panic!("expected timeout result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_check_set_is_healthy() {
        let summary = aggregator().aggregate(&[]).await.unwrap();
        assert_eq!(summary.total, 0);
    }
}
