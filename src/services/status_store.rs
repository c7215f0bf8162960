//! Status store capability and its in-memory implementation.

use crate::models::{PipelineStatus, ProbeMarker};
use crate::services::StoreResult;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Statuses retained by [`InMemoryStatusStore::history`]
pub const STATUS_HISTORY_CAPACITY: usize = 128;

/// Durable home of the derived pipeline status
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Idempotent upsert keyed by `status.pipeline`; last write wins
    async fn write_status(&self, status: &PipelineStatus) -> StoreResult<()>;

    async fn read_status(&self, pipeline: &str) -> StoreResult<Option<PipelineStatus>>;

    /// Append a write-probe marker to `table`
    async fn write_marker(&self, table: &str, marker: &ProbeMarker) -> StoreResult<()>;
}

/// Marker writes seen for one table; only the latest marker is kept
#[derive(Debug, Clone)]
struct MarkerTally {
    count: usize,
    latest: ProbeMarker,
}

/// Process-local status store for development and tests.
///
/// Memory stays bounded over a long run: status history is a ring of
/// [`STATUS_HISTORY_CAPACITY`] entries and markers are tallied per table.
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    statuses: DashMap<String, PipelineStatus>,
    history: Mutex<VecDeque<PipelineStatus>>,
    markers: DashMap<String, MarkerTally>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent statuses written, oldest first
    pub fn history(&self) -> Vec<PipelineStatus> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn marker_count(&self, table: &str) -> usize {
        self.markers.get(table).map_or(0, |tally| tally.count)
    }

    pub fn latest_marker(&self, table: &str) -> Option<ProbeMarker> {
        self.markers.get(table).map(|tally| tally.latest.clone())
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn write_status(&self, status: &PipelineStatus) -> StoreResult<()> {
        self.statuses.insert(status.pipeline.clone(), status.clone());
        let mut history = self.history.lock();
        if history.len() == STATUS_HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(status.clone());
        Ok(())
    }

    async fn read_status(&self, pipeline: &str) -> StoreResult<Option<PipelineStatus>> {
        Ok(self.statuses.get(pipeline).map(|entry| entry.value().clone()))
    }

    async fn write_marker(&self, table: &str, marker: &ProbeMarker) -> StoreResult<()> {
        self.markers
            .entry(table.to_string())
            .and_modify(|tally| {
                tally.count += 1;
                tally.latest = marker.clone();
            })
            .or_insert_with(|| MarkerTally {
                count: 1,
                latest: marker.clone(),
            });
        Ok(())
    }
}
