//! Audit store capability and its in-memory implementation.

use crate::constants::AuditEventType;
use crate::models::AuditEvent;
use crate::services::StoreResult;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Append-only audit log
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> StoreResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in append order
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn events_of(&self, event_type: AuditEventType) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.event_type == event_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, event: &AuditEvent) -> StoreResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
