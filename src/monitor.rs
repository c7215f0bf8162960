//! # Pipeline Monitor
//!
//! Owns the configured checks, the breaker-wrapped health cycle, the recovery
//! orchestrator and the collaborator backends, and exposes the operation
//! surface used by the scheduler and the web API.

use crate::config::MonitorConfig;
use crate::constants::{AuditEventType, PipelineHealth};
use crate::error::{MonitorError, MonitorResult};
use crate::health::{AggregateSummary, HealthAggregator, NetworkProbeExecutor, ProbeExecutor};
use crate::models::PipelineStatus;
use crate::recovery::{RecoveryOrchestrator, RecoveryOutcome};
use crate::reporting::{AuditTrail, PipelineStatusReporter, SinkMetrics, SinkMetricsSnapshot};
use crate::resilience::{CircuitBreaker, CircuitBreakerMetrics, CircuitState, HealthCircuit};
use crate::services::ServiceBackends;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct PipelineMonitor {
    config: Arc<MonitorConfig>,
    services: ServiceBackends,
    circuit: HealthCircuit,
    recovery: RecoveryOrchestrator,
    audit: AuditTrail,
    sink_metrics: Arc<SinkMetrics>,
}

impl PipelineMonitor {
    /// Validate `config`, connect the configured backends and build the monitor
    pub async fn from_config(config: Arc<MonitorConfig>) -> MonitorResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MonitorError::Internal(format!("failed to build HTTP client: {e}")))?;
        let services = ServiceBackends::from_config(&config, client.clone()).await?;
        let executor = Arc::new(NetworkProbeExecutor::new(
            client,
            Arc::clone(&services.status_store),
            config.pipeline_name.clone(),
        ));

        Ok(Self::with_components(config, services, executor))
    }

    /// Assemble a monitor from explicit collaborators
    pub fn with_components(
        config: Arc<MonitorConfig>,
        services: ServiceBackends,
        executor: Arc<dyn ProbeExecutor>,
    ) -> Self {
        let pipeline_name = config.pipeline_name.clone();
        let sink_metrics = Arc::new(SinkMetrics::default());
        let sink_timeout = Duration::from_millis(config.store.write_timeout_ms);
        let audit = AuditTrail::new(
            Arc::clone(&services.audit_store),
            pipeline_name.clone(),
            config.audit_ttl_days,
            Arc::clone(&sink_metrics),
        )
        .with_timeout(sink_timeout);

        let reporter = Arc::new(
            PipelineStatusReporter::new(
                pipeline_name.clone(),
                Arc::clone(&services.status_store),
                audit.clone(),
                Arc::clone(&services.notifier),
                Arc::clone(&sink_metrics),
            )
            .with_timeout(sink_timeout),
        );
        let aggregator = Arc::new(HealthAggregator::new(
            pipeline_name.clone(),
            config.checks.clone(),
            executor,
        ));
        let breaker = CircuitBreaker::new(
            pipeline_name.clone(),
            config.breaker_config(),
            reporter,
        );
        let circuit = HealthCircuit::new(breaker, Arc::clone(&aggregator));
        let recovery = RecoveryOrchestrator::new(
            pipeline_name,
            aggregator,
            audit.clone(),
            config.warm_up_url.clone(),
        );

        Self {
            config,
            services,
            circuit,
            recovery,
            audit,
            sink_metrics,
        }
    }

    /// Seed the persisted status and record a startup audit event.
    ///
    /// Unlike transition writes, a failing status write here is returned.
    pub async fn initialize(&self) -> MonitorResult<()> {
        let circuit_state = self.circuit_state();
        let status = PipelineStatus::for_state(
            &self.config.pipeline_name,
            PipelineHealth::Ok,
            circuit_state,
            json!({ "event": "startup" }),
        );

        if let Err(e) = self.services.status_store.write_status(&status).await {
            self.sink_metrics.record_status_write(false);
            return Err(e.into());
        }
        self.sink_metrics.record_status_write(true);

        self.audit
            .record(
                AuditEventType::Status,
                json!({
                    "status": PipelineHealth::Ok,
                    "circuitState": circuit_state,
                    "message": "Pipeline monitor initialized",
                }),
            )
            .await;

        info!(
            pipeline = %self.config.pipeline_name,
            checks = self.config.checks.len(),
            state = %circuit_state,
            "Pipeline monitor initialized"
        );
        Ok(())
    }

    /// Run one breaker-protected health cycle
    pub async fn fire(&self) -> MonitorResult<AggregateSummary> {
        Ok(self.circuit.fire().await?)
    }

    /// Persisted status, or the initializing fallback when none exists
    pub async fn current_status(&self) -> MonitorResult<PipelineStatus> {
        let stored = self
            .services
            .status_store
            .read_status(&self.config.pipeline_name)
            .await?;

        Ok(stored.unwrap_or_else(|| {
            PipelineStatus::initializing(&self.config.pipeline_name, self.circuit_state())
        }))
    }

    pub async fn attempt_recovery(&self, reason: Option<&str>) -> RecoveryOutcome {
        self.recovery.attempt_recovery(reason).await
    }

    /// Health derived from the breaker alone
    pub fn circuit_health(&self) -> PipelineHealth {
        self.circuit_state().health()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit.breaker().state()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        self.circuit.breaker()
    }

    pub fn breaker_metrics(&self) -> CircuitBreakerMetrics {
        self.circuit.breaker().metrics()
    }

    pub fn sink_metrics(&self) -> SinkMetricsSnapshot {
        self.sink_metrics.snapshot()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn pipeline_name(&self) -> &str {
        &self.config.pipeline_name
    }
}
