//! # Service Backends
//!
//! Collaborator capabilities (status store, audit store, alert channel) with
//! in-memory and networked implementations.

pub mod audit_store;
pub mod backends;
pub mod error;
pub mod notifier;
pub mod postgres;
pub mod status_store;

pub use audit_store::{AuditStore, InMemoryAuditStore};
pub use backends::ServiceBackends;
pub use error::{NotifyError, StoreError, StoreResult};
pub use notifier::{Alert, InMemoryNotifier, LogOnlyNotifier, Notifier, WebhookNotifier};
pub use postgres::{ensure_schema, PgAuditStore, PgStatusStore};
pub use status_store::{InMemoryStatusStore, StatusStore, STATUS_HISTORY_CAPACITY};
