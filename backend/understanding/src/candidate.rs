//! Model-backed secondary extraction and tolerant reply parsing.
//!
//! Models wrap JSON in code fences, prepend chatter, return numbers where
//! strings were asked for, and report confidence as 0.87 or 87. Everything
//! is coerced into a [`StructuredCandidate`] here; anything without a JSON
//! object in it is a `MalformedCandidate`.

use std::sync::Arc;

use async_trait::async_trait;
use chequeforge_core::{
    CandidateExtractor, CandidateField, CandidateRequest, ChequeError, ChequeField, LlmProvider, LlmRequest,
    MicrCandidate, StructuredCandidate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap());

/// Secondary source over a text LLM provider.
pub struct TextModelExtractor {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
}

impl TextModelExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 1024,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl CandidateExtractor for TextModelExtractor {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn infer(&self, request: &CandidateRequest<'_>) -> Result<StructuredCandidate, ChequeError> {
        let llm_request = LlmRequest {
            model: self.model.clone(),
            system_prompt: request.instruction.to_string(),
            user_prompt: format!("OCR text of the cheque:\n{}", request.text),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            json_output: true,
        };
        let response = self
            .provider
            .complete(&llm_request)
            .await
            .map_err(|e| ChequeError::Secondary {
                provider: self.provider.name().to_string(),
                message: e.to_string(),
            })?;
        debug!(
            provider = %response.provider,
            model = %response.model,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "secondary reply received"
        );
        parse_candidate(&response.content)
    }
}

// ---------------------------------------------------------------------------
// Reply coercion
// ---------------------------------------------------------------------------

/// Coerce a free-form model reply into a candidate.
pub fn parse_candidate(reply: &str) -> Result<StructuredCandidate, ChequeError> {
    let unfenced = CODE_FENCE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map_or(reply, |m| m.as_str());
    let object_text = first_json_object(unfenced)
        .ok_or_else(|| ChequeError::MalformedCandidate("no JSON object in reply".into()))?;
    let value: Value = serde_json::from_str(object_text)
        .map_err(|e| ChequeError::MalformedCandidate(format!("invalid JSON: {e}")))?;
    let Value::Object(obj) = value else {
        return Err(ChequeError::MalformedCandidate("reply is not a JSON object".into()));
    };

    let mut candidate = StructuredCandidate::default();
    for field in ChequeField::ALL {
        if let Some(slot) = candidate.field_mut(field) {
            *slot = lookup(&obj, field.key()).map(coerce_field).unwrap_or_default();
        }
    }
    candidate.micr = lookup(&obj, "micr").map(coerce_micr).unwrap_or_default();
    Ok(candidate)
}

/// The first balanced `{...}` span, honouring JSON string escapes.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Look up a camelCase key, also accepting its snake_case spelling.
fn lookup<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).or_else(|| obj.get(&snake_case(key)))
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_field(value: &Value) -> CandidateField {
    match value {
        Value::Object(obj) => CandidateField {
            value: obj.get("value").and_then(scalar),
            confidence: obj.get("confidence").and_then(coerce_confidence),
            rationale: obj.get("rationale").and_then(Value::as_str).map(str::to_string),
        },
        other => CandidateField {
            value: scalar(other),
            ..Default::default()
        },
    }
}

/// Confidence as 0–1 or 0–100 (number or numeric string) to 0–100.
fn coerce_confidence(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok()?,
        _ => return None,
    };
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let scaled = if raw <= 1.0 { raw * 100.0 } else { raw };
    Some(scaled.round().min(100.0) as u8)
}

fn coerce_micr(value: &Value) -> MicrCandidate {
    match value {
        Value::Object(obj) => {
            let field = |key: &str| lookup(obj, key).map(coerce_field).unwrap_or_default();
            MicrCandidate {
                raw: field("raw"),
                cheque_no: field("chequeNo"),
                bank_code: field("bankCode"),
                branch_code: field("branchCode"),
                payer_account_no: field("payerAccountNo"),
                tran_code: field("tranCode"),
            }
        }
        other => MicrCandidate {
            raw: coerce_field(other),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chequeforge_providers::MockProvider;

    #[test]
    fn fenced_reply_with_mixed_shapes() {
        let reply = r#"Sure! Here is the data:
```json
{
  "payeeName": {"value": "John Doe", "confidence": 0.93, "rationale": "clear print"},
  "amount": 1250.5,
  "cheque_date": "15-06-2024",
  "payerName": {"value": "unknown", "confidence": 40},
  "micr": {"chequeNo": "123456", "payerAccountNo": {"value": "0123456789", "confidence": "88%"}}
}
```"#;
        let c = parse_candidate(reply).unwrap();
        assert_eq!(c.payee_name.value.as_deref(), Some("John Doe"));
        assert_eq!(c.payee_name.confidence, Some(93));
        assert_eq!(c.payee_name.rationale.as_deref(), Some("clear print"));
        assert_eq!(c.amount.value.as_deref(), Some("1250.5"));
        assert_eq!(c.cheque_date.value.as_deref(), Some("15-06-2024"));
        assert_eq!(c.payer_name.usable_value(), None);
        assert_eq!(c.micr.cheque_no.value.as_deref(), Some("123456"));
        assert_eq!(c.micr.payer_account_no.confidence, Some(88));
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_object() {
        let reply = r#"{"payeeName": "A {weird} \"name\""} trailing }"#;
        let c = parse_candidate(reply).unwrap();
        assert_eq!(c.payee_name.value.as_deref(), Some("A {weird} \"name\""));
    }

    #[test]
    fn reply_without_json_is_malformed() {
        for reply in ["I cannot read this cheque.", "{\"payeeName\": ", "[1, 2]"] {
            assert!(
                matches!(parse_candidate(reply), Err(ChequeError::MalformedCandidate(_))),
                "reply: {reply}"
            );
        }
    }

    #[test]
    fn confidence_scales() {
        assert_eq!(coerce_confidence(&Value::from(0.5)), Some(50));
        assert_eq!(coerce_confidence(&Value::from(72)), Some(72));
        assert_eq!(coerce_confidence(&Value::from(250)), Some(100));
        assert_eq!(coerce_confidence(&Value::from(-3)), None);
    }

    #[tokio::test]
    async fn text_model_extractor_round_trip() {
        let provider = MockProvider::new("mock").with_response(r#"{"payeeName": "Jane Tan"}"#);
        let extractor = TextModelExtractor::new(Arc::new(provider), "mock-model");
        let request = CandidateRequest {
            text: "PAY Jane Tan",
            image: None,
            instruction: "extract",
        };
        let candidate = extractor.infer(&request).await.unwrap();
        assert_eq!(candidate.payee_name.value.as_deref(), Some("Jane Tan"));
    }

    #[tokio::test]
    async fn provider_failure_is_a_secondary_error() {
        let provider = MockProvider::new("mock").failing("connection refused");
        let extractor = TextModelExtractor::new(Arc::new(provider), "mock-model");
        let request = CandidateRequest {
            text: "PAY Jane Tan",
            image: None,
            instruction: "extract",
        };
        match extractor.infer(&request).await {
            Err(ChequeError::Secondary { provider, message }) => {
                assert_eq!(provider, "mock");
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
