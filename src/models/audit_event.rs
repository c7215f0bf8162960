use crate::constants::AuditEventType;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Append-only audit record.
///
/// `expires_at` is advisory metadata for the store's own cleanup; nothing in
/// this crate deletes or mutates audit events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    pub pipeline_name: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub detail: Value,
    pub expires_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        pipeline_name: impl Into<String>,
        event_type: AuditEventType,
        detail: Value,
        ttl_days: u32,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            id: Uuid::new_v4(),
            pipeline_name: pipeline_name.into(),
            timestamp,
            event_type,
            detail,
            expires_at: expiry_after(timestamp, ttl_days),
        }
    }
}

/// `timestamp + ttl_days`, saturating at the latest representable instant
fn expiry_after(timestamp: DateTime<Utc>, ttl_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(ttl_days))
        .and_then(|ttl| timestamp.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
