use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chequeforge_core::{LlmProvider, LlmRequest, LlmResponse};

/// Ollama local LLM provider.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

/// Strip any routing prefix such as "ollama/" or "meta/".
fn local_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

fn chat_body(request: &LlmRequest) -> OllamaChatRequest {
    let system = (!request.system_prompt.is_empty()).then(|| OllamaChatMessage {
        role: "system".to_string(),
        content: request.system_prompt.clone(),
    });
    let user = OllamaChatMessage {
        role: "user".to_string(),
        content: request.user_prompt.clone(),
    };

    OllamaChatRequest {
        model: local_model_name(&request.model).to_string(),
        messages: system.into_iter().chain([user]).collect(),
        stream: false,
        format: request.json_output.then_some("json"),
        options: OllamaOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        },
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let body = chat_body(request);
        debug!(model = %body.model, url = %self.base_url, "Asking local model for cheque fields");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Ollama unreachable at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {detail}");
        }

        let reply: OllamaChatResponse = response
            .json()
            .await
            .context("Ollama reply was not a chat response")?;

        Ok(LlmResponse {
            content: reply.message.content,
            provider: "ollama".to_string(),
            model: body.model,
            tokens_used: reply.eval_count.unwrap_or(0) + reply.prompt_eval_count.unwrap_or(0),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_routing_prefix() {
        assert_eq!(local_model_name("ollama/llama3.2"), "llama3.2");
        assert_eq!(local_model_name("qwen2.5:7b"), "qwen2.5:7b");
    }

    #[test]
    fn body_requests_json_and_skips_empty_system() {
        let request = LlmRequest {
            model: "ollama/llama3.2".into(),
            system_prompt: String::new(),
            user_prompt: "RM 1,250.00".into(),
            max_tokens: 256,
            temperature: 0.0,
            json_output: true,
        };
        let body = serde_json::to_value(chat_body(&request)).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["options"]["num_predict"], 256);
    }
}
