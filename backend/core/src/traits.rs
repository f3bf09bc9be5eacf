use anyhow::Result;
use async_trait::async_trait;

use crate::candidate::StructuredCandidate;
use crate::error::ChequeError;
use crate::types::ChequeImage;

/// OCR capability: image in, full recognized text out.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Provider name (e.g., "google-vision").
    fn name(&self) -> &str;

    /// Recognize all text in the image, newline-delimited.
    ///
    /// An image without any text is `ChequeError::NoText`.
    async fn recognize(&self, image: &ChequeImage) -> Result<String, ChequeError>;
}

/// What the secondary source is asked to interpret.
#[derive(Debug, Clone, Copy)]
pub struct CandidateRequest<'a> {
    /// Normalized OCR text of the cheque.
    pub text: &'a str,
    /// The raw image, for vision-capable sources.
    pub image: Option<&'a ChequeImage>,
    /// The field-extraction instruction.
    pub instruction: &'a str,
}

/// Model-based secondary extraction capability.
#[async_trait]
pub trait CandidateExtractor: Send + Sync {
    /// Source name, used in logs and review notes.
    fn name(&self) -> &str;

    /// Whether this source reads the image rather than the text.
    fn wants_image(&self) -> bool {
        false
    }

    /// Produce a best-effort structured guess for every field.
    async fn infer(
        &self,
        request: &CandidateRequest<'_>,
    ) -> Result<StructuredCandidate, ChequeError>;
}

/// Trait for text LLM providers backing a secondary source.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the backend to constrain output to a JSON object, where supported.
    pub json_output: bool,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
