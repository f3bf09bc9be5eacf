/// Vision-model access: transcribe a cheque, or extract its fields directly
/// from the image.
use anyhow::{Result, bail};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chequeforge_core::{
    CandidateExtractor, CandidateRequest, ChequeError, ChequeImage, StructuredCandidate, TextRecognizer,
};
use reqwest::Client;
use tracing::info;

use crate::candidate::parse_candidate;

const TRANSCRIBE_PROMPT: &str = "Transcribe every line of printed and handwritten text on this bank cheque, \
top to bottom, one line per output line. Include the MICR line at the bottom exactly as printed. \
Output the text only.";

/// Supported vision providers.
#[derive(Debug, Clone)]
pub enum VisionProvider {
    OpenAI { api_key: String, model: String, base_url: String },
    Gemini { api_key: String, model: String },
}

impl VisionProvider {
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::OpenAI {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Any OpenAI-compatible endpoint (OpenRouter, a local gateway).
    pub fn openai_compatible(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::OpenAI {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn gemini(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::Gemini {
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAI { .. } => "openai-vision",
            Self::Gemini { .. } => "gemini-vision",
        }
    }
}

/// Ask a vision model about an image.
pub async fn describe_image(
    client: &Client,
    provider: &VisionProvider,
    image: &ChequeImage,
    prompt: &str,
) -> Result<String> {
    let b64 = STANDARD.encode(&image.bytes);
    match provider {
        VisionProvider::OpenAI { api_key, model, base_url } => {
            describe_via_openai(client, base_url, api_key, model, &b64, &image.mime_type, prompt).await
        }
        VisionProvider::Gemini { api_key, model } => {
            describe_via_gemini(client, api_key, model, &b64, &image.mime_type, prompt).await
        }
    }
}

async fn describe_via_openai(
    client: &Client, base_url: &str, api_key: &str, model: &str, b64: &str, mime_type: &str, prompt: &str,
) -> Result<String> {
    info!("[Vision] Reading cheque via OpenAI-compatible {}", model);
    let body = serde_json::json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url",
                  "image_url": { "url": format!("data:{};base64,{}", mime_type, b64) } }
            ]
        }],
        "max_tokens": 1024,
        "temperature": 0
    });
    let resp = client
        .post(format!("{base_url}/chat/completions"))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await?;
    if !resp.status().is_success() {
        bail!("OpenAI vision error: {}", resp.text().await.unwrap_or_default());
    }
    let json: serde_json::Value = resp.json().await?;
    Ok(json["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string())
}

async fn describe_via_gemini(
    client: &Client, api_key: &str, model: &str, b64: &str, mime_type: &str, prompt: &str,
) -> Result<String> {
    info!("[Vision] Reading cheque via Gemini {}", model);
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
    );
    let body = serde_json::json!({
        "contents": [{ "parts": [
            { "text": prompt },
            { "inlineData": { "mimeType": mime_type, "data": b64 } }
        ]}]
    });
    let resp = client
        .post(&url)
        .query(&[("key", api_key)])
        .json(&body)
        .send()
        .await?;
    if !resp.status().is_success() {
        bail!("Gemini vision error: {}", resp.text().await.unwrap_or_default());
    }
    let json: serde_json::Value = resp.json().await?;
    Ok(json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("")
        .to_string())
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// OCR through a vision model, for deployments without a Vision API key.
pub struct VisionModelRecognizer {
    client: Client,
    provider: VisionProvider,
}

impl VisionModelRecognizer {
    pub fn new(provider: VisionProvider) -> Self {
        Self { client: Client::new(), provider }
    }
}

#[async_trait]
impl TextRecognizer for VisionModelRecognizer {
    fn name(&self) -> &str {
        self.provider.label()
    }

    async fn recognize(&self, image: &ChequeImage) -> Result<String, ChequeError> {
        let text = describe_image(&self.client, &self.provider, image, TRANSCRIBE_PROMPT)
            .await
            .map_err(|e| ChequeError::Recognition {
                provider: self.provider.label().to_string(),
                message: e.to_string(),
            })?;
        if text.trim().is_empty() {
            return Err(ChequeError::NoText);
        }
        Ok(text)
    }
}

/// Secondary source that reads the fields straight off the image.
pub struct VisionModelExtractor {
    client: Client,
    provider: VisionProvider,
}

impl VisionModelExtractor {
    pub fn new(provider: VisionProvider) -> Self {
        Self { client: Client::new(), provider }
    }
}

#[async_trait]
impl CandidateExtractor for VisionModelExtractor {
    fn name(&self) -> &str {
        self.provider.label()
    }

    fn wants_image(&self) -> bool {
        true
    }

    async fn infer(&self, request: &CandidateRequest<'_>) -> Result<StructuredCandidate, ChequeError> {
        let Some(image) = request.image else {
            return Err(ChequeError::Secondary {
                provider: self.name().to_string(),
                message: "no image supplied".into(),
            });
        };
        let prompt = format!(
            "{}\n\nOCR text of the same cheque, for reference only:\n{}",
            request.instruction, request.text
        );
        let reply = describe_image(&self.client, &self.provider, image, &prompt)
            .await
            .map_err(|e| ChequeError::Secondary {
                provider: self.name().to_string(),
                message: e.to_string(),
            })?;
        parse_candidate(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_identify_the_backend() {
        assert_eq!(VisionProvider::openai("k", "gpt-4o").label(), "openai-vision");
        assert_eq!(VisionProvider::gemini("k", "gemini-2.0-flash").label(), "gemini-vision");
    }

    #[test]
    fn compatible_base_url_is_normalized() {
        match VisionProvider::openai_compatible("k", "m", "https://openrouter.ai/api/v1/") {
            VisionProvider::OpenAI { base_url, .. } => assert_eq!(base_url, "https://openrouter.ai/api/v1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn extractor_without_image_fails() {
        let extractor = VisionModelExtractor::new(VisionProvider::gemini("k", "gemini-2.0-flash"));
        let request = CandidateRequest {
            text: "PAY John",
            image: None,
            instruction: "extract",
        };
        let err = extractor.infer(&request).await.unwrap_err();
        assert!(matches!(err, ChequeError::Secondary { .. }));
    }
}
