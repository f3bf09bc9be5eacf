//! Telemetry and structured logging components for ChequeForge.
//!
//! Handles log redaction, console plus rolling JSON file output, and the
//! cheque lifecycle event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ExtractionEvent, ExtractionEventLogger, EventLogEntry, EVENT_TARGET};
pub use logger::init_logger;
pub use tracing_appender::non_blocking::WorkerGuard;
pub use redact::redact_sensitive_data;
