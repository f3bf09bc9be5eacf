//! Optical Character Recognition via Google Cloud Vision.
//!
//! One `images:annotate` call with `TEXT_DETECTION`; the full-page
//! annotation is returned as newline-delimited text.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chequeforge_core::{ChequeError, ChequeImage, TextRecognizer};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

const PROVIDER: &str = "google-vision";
const ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

pub struct GoogleVisionRecognizer {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GoogleVisionRecognizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: ANNOTATE_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    fn error(message: impl Into<String>) -> ChequeError {
        ChequeError::Recognition {
            provider: PROVIDER.to_string(),
            message: message.into(),
        }
    }
}

/// Pull the recognized text out of an `images:annotate` response.
fn annotated_text(body: &Value) -> Result<String, ChequeError> {
    let first = &body["responses"][0];
    if let Some(message) = first["error"]["message"].as_str() {
        return Err(GoogleVisionRecognizer::error(message));
    }
    let text = first["fullTextAnnotation"]["text"]
        .as_str()
        .or_else(|| first["textAnnotations"][0]["description"].as_str())
        .unwrap_or("");
    if text.trim().is_empty() {
        return Err(ChequeError::NoText);
    }
    Ok(text.to_string())
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn recognize(&self, image: &ChequeImage) -> Result<String, ChequeError> {
        info!(file = %image.file_name, bytes = image.bytes.len(), "Running OCR via Google Vision");

        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(&image.bytes) },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::error(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::error(format!("HTTP {status}: {text}")));
        }
        let json: Value = resp.json().await.map_err(|e| Self::error(e.to_string()))?;
        let text = annotated_text(&json)?;
        debug!(chars = text.len(), "OCR complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_full_text_annotation() {
        let body = json!({ "responses": [{ "fullTextAnnotation": { "text": "PAY John Doe\nRM 10.00" } }] });
        assert_eq!(annotated_text(&body).unwrap(), "PAY John Doe\nRM 10.00");
    }

    #[test]
    fn falls_back_to_first_text_annotation() {
        let body = json!({ "responses": [{ "textAnnotations": [{ "description": "PAY Jane" }] }] });
        assert_eq!(annotated_text(&body).unwrap(), "PAY Jane");
    }

    #[test]
    fn empty_response_is_no_text() {
        let body = json!({ "responses": [{}] });
        assert!(matches!(annotated_text(&body), Err(ChequeError::NoText)));
    }

    #[test]
    fn api_error_is_a_recognition_failure() {
        let body = json!({ "responses": [{ "error": { "code": 3, "message": "Bad image data." } }] });
        match annotated_text(&body) {
            Err(ChequeError::Recognition { provider, message }) => {
                assert_eq!(provider, "google-vision");
                assert_eq!(message, "Bad image data.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
