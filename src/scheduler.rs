//! # Health Scheduler
//!
//! Background task firing the health cycle on a fixed interval. Each tick runs
//! as its own task; a slow cycle does not delay or block the next one.

use crate::monitor::PipelineMonitor;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct HealthScheduler {
    monitor: Arc<PipelineMonitor>,
    interval: Duration,
}

impl HealthScheduler {
    pub fn new(monitor: Arc<PipelineMonitor>, interval: Duration) -> Self {
        Self { monitor, interval }
    }

    /// Spawn the scheduling loop.
    ///
    /// The first cycle runs one interval after spawning. Abort the returned
    /// handle to stop scheduling; cycles already started run to completion.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            pipeline = %self.monitor.pipeline_name(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting health scheduler"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let monitor = Arc::clone(&self.monitor);
                tokio::spawn(async move { run_cycle(&monitor).await });
            }
        })
    }
}

async fn run_cycle(monitor: &PipelineMonitor) {
    match monitor.fire().await {
        Ok(summary) => debug!(
            pipeline = %monitor.pipeline_name(),
            passed = summary.passed,
            total = summary.total,
            "Health cycle passed"
        ),
        Err(e) if e.is_circuit_open() => debug!(
            pipeline = %monitor.pipeline_name(),
            "Health cycle skipped - circuit open"
        ),
        Err(e) => warn!(
            pipeline = %monitor.pipeline_name(),
            state = %monitor.circuit_state(),
            error = %e,
            "Health cycle failed"
        ),
    }
}
