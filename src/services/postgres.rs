//! # PostgreSQL Stores
//!
//! Status and audit stores backed by one shared `PgPool`. Table names come
//! from validated configuration and are interpolated as identifiers; every
//! value is bound.

use crate::config::is_valid_table_identifier;
use crate::models::{AuditEvent, PipelineStatus, ProbeMarker};
use crate::services::{AuditStore, StatusStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

fn checked_table(table: &str) -> StoreResult<&str> {
    if is_valid_table_identifier(table) {
        Ok(table)
    } else {
        Err(StoreError::Decode(format!("invalid table name: {table}")))
    }
}

/// Create the status, audit and marker tables if they are missing
pub async fn ensure_schema(
    pool: &PgPool,
    status_table: &str,
    audit_table: &str,
    marker_tables: &[&str],
) -> StoreResult<()> {
    let status_table = checked_table(status_table)?;
    let audit_table = checked_table(audit_table)?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {status_table} (
            pipeline TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            circuit_state TEXT NOT NULL,
            suggested_action TEXT NOT NULL,
            editor_message TEXT NOT NULL,
            details JSONB NOT NULL DEFAULT 'null'::jsonb,
            updated_at TIMESTAMPTZ NOT NULL
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {audit_table} (
            id UUID PRIMARY KEY,
            pipeline_name TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL,
            event_type TEXT NOT NULL,
            detail JSONB NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        )"
    ))
    .execute(pool)
    .await?;

    for table in marker_tables {
        let table = checked_table(table)?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id BIGSERIAL PRIMARY KEY,
                pipeline TEXT NOT NULL,
                probe TEXT NOT NULL,
                written_at TIMESTAMPTZ NOT NULL,
                note TEXT NOT NULL
            )"
        ))
        .execute(pool)
        .await?;
    }

    info!(
        status_table = %status_table,
        audit_table = %audit_table,
        marker_tables = ?marker_tables,
        "Store schema ensured"
    );
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgStatusStore {
    pool: PgPool,
    table: String,
}

impl PgStatusStore {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn write_status(&self, status: &PipelineStatus) -> StoreResult<()> {
        let table = checked_table(&self.table)?;
        sqlx::query(&format!(
            "INSERT INTO {table}
                (pipeline, status, circuit_state, suggested_action, editor_message, details, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (pipeline) DO UPDATE SET
                status = EXCLUDED.status,
                circuit_state = EXCLUDED.circuit_state,
                suggested_action = EXCLUDED.suggested_action,
                editor_message = EXCLUDED.editor_message,
                details = EXCLUDED.details,
                updated_at = EXCLUDED.updated_at"
        ))
        .bind(&status.pipeline)
        .bind(status.status.as_str())
        .bind(status.circuit_state.as_str())
        .bind(&status.suggested_action)
        .bind(&status.editor_message)
        .bind(&status.details)
        .bind(status.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(pipeline = %status.pipeline, status = %status.status, "Status written");
        Ok(())
    }

    async fn read_status(&self, pipeline: &str) -> StoreResult<Option<PipelineStatus>> {
        let table = checked_table(&self.table)?;
        let row = sqlx::query(&format!(
            "SELECT pipeline, status, circuit_state, suggested_action, editor_message, details, updated_at
             FROM {table} WHERE pipeline = $1"
        ))
        .bind(pipeline)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: String = row.try_get("status")?;
        let circuit_state: String = row.try_get("circuit_state")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Some(PipelineStatus {
            pipeline: row.try_get("pipeline")?,
            status: status.parse().map_err(StoreError::Decode)?,
            circuit_state: circuit_state.parse().map_err(StoreError::Decode)?,
            suggested_action: row.try_get("suggested_action")?,
            editor_message: row.try_get("editor_message")?,
            details: row.try_get("details")?,
            updated_at,
        }))
    }

    async fn write_marker(&self, table: &str, marker: &ProbeMarker) -> StoreResult<()> {
        let table = checked_table(table)?;
        sqlx::query(&format!(
            "INSERT INTO {table} (pipeline, probe, written_at, note) VALUES ($1, $2, $3, $4)"
        ))
        .bind(&marker.pipeline)
        .bind(&marker.probe)
        .bind(marker.written_at)
        .bind(&marker.note)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
    table: String,
}

impl PgAuditStore {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn append(&self, event: &AuditEvent) -> StoreResult<()> {
        let table = checked_table(&self.table)?;
        sqlx::query(&format!(
            "INSERT INTO {table} (id, pipeline_name, timestamp, event_type, detail, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(event.id)
        .bind(&event.pipeline_name)
        .bind(event.timestamp)
        .bind(event.event_type.as_str())
        .bind(&event.detail)
        .bind(event.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
