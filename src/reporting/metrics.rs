use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of collaborator writes, shared by all sink adapters
#[derive(Debug, Default)]
pub struct SinkMetrics {
    status_writes: AtomicU64,
    status_write_failures: AtomicU64,
    audit_writes: AtomicU64,
    audit_write_failures: AtomicU64,
    alerts_sent: AtomicU64,
    alert_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkMetricsSnapshot {
    pub status_writes: u64,
    pub status_write_failures: u64,
    pub audit_writes: u64,
    pub audit_write_failures: u64,
    pub alerts_sent: u64,
    pub alert_failures: u64,
}

impl SinkMetrics {
    pub fn record_status_write(&self, ok: bool) {
        Self::bump(ok, &self.status_writes, &self.status_write_failures);
    }

    pub fn record_audit_write(&self, ok: bool) {
        Self::bump(ok, &self.audit_writes, &self.audit_write_failures);
    }

    pub fn record_alert(&self, ok: bool) {
        Self::bump(ok, &self.alerts_sent, &self.alert_failures);
    }

    fn bump(ok: bool, success: &AtomicU64, failure: &AtomicU64) {
        if ok {
            success.fetch_add(1, Ordering::Relaxed);
        } else {
            failure.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            status_writes: self.status_writes.load(Ordering::Relaxed),
            status_write_failures: self.status_write_failures.load(Ordering::Relaxed),
            audit_writes: self.audit_writes.load(Ordering::Relaxed),
            audit_write_failures: self.audit_write_failures.load(Ordering::Relaxed),
            alerts_sent: self.alerts_sent.load(Ordering::Relaxed),
            alert_failures: self.alert_failures.load(Ordering::Relaxed),
        }
    }
}
