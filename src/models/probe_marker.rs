use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record left behind by the write-capability probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeMarker {
    pub pipeline: String,
    pub probe: String,
    pub written_at: DateTime<Utc>,
    pub note: String,
}

impl ProbeMarker {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            probe: "db-write-check".to_string(),
            written_at: Utc::now(),
            note: "health-check".to_string(),
        }
    }
}
