//! Collaborator wiring selected once from configuration.

use crate::config::{ConfigurationError, MonitorConfig, StoreBackend};
use crate::error::MonitorResult;
use crate::health::CheckKind;
use crate::services::{
    ensure_schema, AuditStore, InMemoryAuditStore, InMemoryStatusStore, LogOnlyNotifier, Notifier,
    PgAuditStore, PgStatusStore, StatusStore, WebhookNotifier,
};
use reqwest::Client;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The three collaborator capabilities the monitor depends on
#[derive(Clone)]
pub struct ServiceBackends {
    pub status_store: Arc<dyn StatusStore>,
    pub audit_store: Arc<dyn AuditStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ServiceBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBackends").finish_non_exhaustive()
    }
}

impl ServiceBackends {
    pub fn new(
        status_store: Arc<dyn StatusStore>,
        audit_store: Arc<dyn AuditStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            status_store,
            audit_store,
            notifier,
        }
    }

    /// In-memory stores and a log-only notifier
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(InMemoryAuditStore::new()),
            Arc::new(LogOnlyNotifier),
        )
    }

    /// Build the configured backends, connecting to PostgreSQL if selected
    pub async fn from_config(config: &MonitorConfig, client: Client) -> MonitorResult<Self> {
        let notifier: Arc<dyn Notifier> = match &config.notifier.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(
                client,
                url.clone(),
                Duration::from_millis(config.notifier.timeout_ms),
            )),
            None => Arc::new(LogOnlyNotifier),
        };

        match config.store.backend {
            StoreBackend::Memory => {
                info!(pipeline = %config.pipeline_name, "Using in-memory stores");
                Ok(Self::new(
                    Arc::new(InMemoryStatusStore::new()),
                    Arc::new(InMemoryAuditStore::new()),
                    notifier,
                ))
            }
            StoreBackend::Postgres => {
                let url = config.store.database_url.as_deref().ok_or_else(|| {
                    ConfigurationError::missing_required_field("store.database_url", "postgres backend")
                })?;

                let pool = PgPoolOptions::new()
                    .max_connections(config.store.max_connections)
                    .connect(url)
                    .await
                    .map_err(crate::services::StoreError::from)?;

                let marker_tables: Vec<&str> = config
                    .checks
                    .iter()
                    .filter(|check| check.kind == CheckKind::DbWrite)
                    .map(|check| check.target.as_str())
                    .collect();
                ensure_schema(
                    &pool,
                    &config.store.status_table,
                    &config.store.audit_table,
                    &marker_tables,
                )
                .await?;

                info!(
                    pipeline = %config.pipeline_name,
                    max_connections = config.store.max_connections,
                    "Using PostgreSQL stores"
                );
                Ok(Self::new(
                    Arc::new(PgStatusStore::new(pool.clone(), config.store.status_table.clone())),
                    Arc::new(PgAuditStore::new(pool, config.store.audit_table.clone())),
                    notifier,
                ))
            }
        }
    }
}
