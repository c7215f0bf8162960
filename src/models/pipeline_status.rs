use crate::constants::PipelineHealth;
use crate::resilience::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Editor-facing status of a pipeline.
///
/// Derived, never authoritative: rewritten on every breaker transition and
/// stored last-write-wins under the pipeline name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    pub pipeline: String,
    pub status: PipelineHealth,
    pub circuit_state: CircuitState,
    pub suggested_action: String,
    pub editor_message: String,
    #[serde(default)]
    pub details: Value,
    pub updated_at: DateTime<Utc>,
}

impl PipelineStatus {
    /// Status for `health` with the catalog suggestion attached
    pub fn for_state(
        pipeline: impl Into<String>,
        health: PipelineHealth,
        circuit_state: CircuitState,
        details: Value,
    ) -> Self {
        let suggestion = health.suggestion();
        Self {
            pipeline: pipeline.into(),
            status: health,
            circuit_state,
            suggested_action: suggestion.action.to_string(),
            editor_message: suggestion.message.to_string(),
            details,
            updated_at: Utc::now(),
        }
    }

    /// Fallback returned when nothing has been persisted yet
    pub fn initializing(pipeline: impl Into<String>, circuit_state: CircuitState) -> Self {
        Self::for_state(pipeline, PipelineHealth::Unknown, circuit_state, Value::Null)
    }
}
