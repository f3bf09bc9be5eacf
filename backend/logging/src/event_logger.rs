//! Cheque Event Logger
//!
//! Lifecycle events (processed, review requested, review completed,
//! secondary failure) written through `tracing` under the `cheque_events`
//! target, so the JSON file layer captures them as NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

/// Target every event is emitted under.
pub const EVENT_TARGET: &str = "cheque_events";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionEvent {
    ChequeProcessed {
        needs_review: bool,
        notes: usize,
        recognizer: String,
        secondary: Option<String>,
        elapsed_ms: u64,
    },
    ReviewRequested {
        notes: Vec<String>,
    },
    ReviewCompleted {
        fields: Vec<String>,
    },
    SecondaryFailed {
        source: String,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub cheque_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ExtractionEvent,
}

/// Stateless logger; cloned freely into request handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionEventLogger;

impl ExtractionEventLogger {
    /// Redact free text in the event and emit it.
    pub fn log_event(&self, cheque_id: &str, event: ExtractionEvent) -> EventLogEntry {
        let entry = EventLogEntry {
            cheque_id: cheque_id.into(),
            timestamp: Utc::now(),
            event: redact_event(event),
        };

        let payload = serde_json::to_string(&entry).unwrap_or_default();
        match entry.event {
            ExtractionEvent::SecondaryFailed { .. } => {
                warn!(target: EVENT_TARGET, cheque_id = %entry.cheque_id, event = %payload, "Cheque event");
            }
            _ => info!(target: EVENT_TARGET, cheque_id = %entry.cheque_id, event = %payload, "Cheque event"),
        }
        entry
    }
}

fn redact_event(mut event: ExtractionEvent) -> ExtractionEvent {
    match &mut event {
        ExtractionEvent::ReviewRequested { notes } => {
            for note in notes.iter_mut() {
                *note = redact_sensitive_data(note);
            }
        }
        ExtractionEvent::SecondaryFailed { message, .. } => {
            *message = redact_sensitive_data(message);
        }
        ExtractionEvent::ChequeProcessed { .. } | ExtractionEvent::ReviewCompleted { .. } => {}
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_notes_are_redacted() {
        let entry = ExtractionEventLogger.log_event(
            "c-1",
            ExtractionEvent::ReviewRequested {
                notes: vec!["Low confidence (60) for MICR: no account 0123456789 token".into()],
            },
        );
        let ExtractionEvent::ReviewRequested { notes } = &entry.event else {
            panic!("wrong event");
        };
        assert!(notes[0].contains("****6789"));
        assert_eq!(entry.cheque_id, "c-1");
    }

    #[test]
    fn serializes_with_type_tag() {
        let entry = ExtractionEventLogger.log_event(
            "c-2",
            ExtractionEvent::SecondaryFailed {
                source: "openrouter".into(),
                message: "timed out after 20s".into(),
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "secondary_failed");
        assert_eq!(json["event"]["source"], "openrouter");
    }
}
