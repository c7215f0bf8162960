//! Persisted records: the derived pipeline status, audit events and write-probe markers.

pub mod audit_event;
pub mod pipeline_status;
pub mod probe_marker;

pub use audit_event::AuditEvent;
pub use pipeline_status::PipelineStatus;
pub use probe_marker::ProbeMarker;
