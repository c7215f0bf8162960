use crate::monitor::PipelineMonitor;
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub monitor: Arc<PipelineMonitor>,
}

impl AppState {
    pub fn new(monitor: Arc<PipelineMonitor>) -> Self {
        Self { monitor }
    }
}
