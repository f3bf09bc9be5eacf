//! Per-field, per-strategy extraction results.

use serde::{Deserialize, Serialize};

/// Result of one extraction strategy for one field.
///
/// Never collapse this to a bare `Option`: the reason and confidence feed the
/// merge policy and the review aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExtractionOutcome<T> {
    Found {
        value: T,
        /// 0–100; `None` means the strategy does not grade itself.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rationale: Option<String>,
    },
    NotFound {
        reason: String,
    },
}

impl<T> ExtractionOutcome<T> {
    pub fn found(value: T) -> Self {
        Self::Found {
            value,
            confidence: None,
            rationale: None,
        }
    }

    /// A match the strategy is unsure about.
    pub fn graded(value: T, confidence: u8, rationale: impl Into<String>) -> Self {
        Self::Found {
            value,
            confidence: Some(confidence.min(100)),
            rationale: Some(rationale.into()),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Found { value, .. } => Some(value),
            Self::NotFound { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Found { value, .. } => Some(value),
            Self::NotFound { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<u8> {
        match self {
            Self::Found { confidence, .. } => *confidence,
            Self::NotFound { .. } => None,
        }
    }

    pub fn rationale(&self) -> Option<&str> {
        match self {
            Self::Found { rationale, .. } => rationale.as_deref(),
            Self::NotFound { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Found { .. } => None,
            Self::NotFound { reason } => Some(reason),
        }
    }

    /// Map the found value, keeping confidence and rationale.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionOutcome<U> {
        match self {
            Self::Found {
                value,
                confidence,
                rationale,
            } => ExtractionOutcome::Found {
                value: f(value),
                confidence,
                rationale,
            },
            Self::NotFound { reason } => ExtractionOutcome::NotFound { reason },
        }
    }
}

/// Which extraction pass produced a merged field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldSource {
    /// Pattern-based, auditable pass.
    Primary,
    /// Model-based gap filler.
    Secondary,
}
