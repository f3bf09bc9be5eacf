//! In-process stand-ins for the recognition and secondary capabilities.

use async_trait::async_trait;
use chequeforge_core::{
    CandidateExtractor, CandidateRequest, ChequeError, ChequeImage, StructuredCandidate, TextRecognizer,
};

use crate::candidate::parse_candidate;

/// Recognizer that returns fixed text, or fails.
pub struct MockRecognizer {
    text: Option<String>,
}

impl MockRecognizer {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()) }
    }

    /// A recognizer that finds nothing on any image.
    pub fn blank() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock-ocr"
    }

    async fn recognize(&self, _image: &ChequeImage) -> Result<String, ChequeError> {
        self.text.clone().ok_or(ChequeError::NoText)
    }
}

enum Behaviour {
    Reply(String),
    Fail(String),
}

/// Secondary source that parses a canned model reply, or fails.
pub struct MockCandidateExtractor {
    behaviour: Behaviour,
}

impl MockCandidateExtractor {
    /// Reply with raw model output; it goes through the real coercion.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self { behaviour: Behaviour::Reply(reply.into()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { behaviour: Behaviour::Fail(message.into()) }
    }
}

#[async_trait]
impl CandidateExtractor for MockCandidateExtractor {
    fn name(&self) -> &str {
        "mock-model"
    }

    async fn infer(&self, _request: &CandidateRequest<'_>) -> Result<StructuredCandidate, ChequeError> {
        match &self.behaviour {
            Behaviour::Reply(reply) => parse_candidate(reply),
            Behaviour::Fail(message) => Err(ChequeError::Secondary {
                provider: "mock-model".into(),
                message: message.clone(),
            }),
        }
    }
}
