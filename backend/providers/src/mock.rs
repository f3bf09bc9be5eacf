use anyhow::{bail, Result};
use async_trait::async_trait;
use chequeforge_core::{LlmProvider, LlmRequest, LlmResponse};

/// A mock LLM provider that returns a canned reply or a canned failure.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    failure: Option<String>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failure: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Every call fails with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse> {
        if let Some(message) = &self.failure {
            bail!("{}", message);
        }
        Ok(LlmResponse {
            content: self.fixed_response.clone().unwrap_or_else(|| "{}".to_string()),
            provider: self.name.clone(),
            model: req.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
