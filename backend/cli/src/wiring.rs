//! Builds the pipeline and gateway state from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use chequeforge_config::{ChequeForgeConfig, OcrConfig, SecondaryConfig, SecondaryInput};
use chequeforge_core::{CandidateExtractor, LlmProvider, TextRecognizer};
use chequeforge_extraction::{ChequePipeline, MergePolicy, PipelineOptions};
use chequeforge_gateway::{GatewayState, UploadDir, WebhookNotifier};
use chequeforge_providers::{
    MockProvider, OllamaProvider, OpenRouterProvider, ProviderRegistry, KNOWN_PROVIDERS,
};
use chequeforge_store::ChequeStore;
use chequeforge_understanding::{
    GoogleVisionRecognizer, MockRecognizer, TextModelExtractor, VisionModelExtractor,
    VisionModelRecognizer, VisionProvider,
};
use logging::ExtractionEventLogger;

const DEFAULT_OPENAI_VISION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GEMINI_VISION_MODEL: &str = "gemini-2.0-flash";

fn required<'a>(value: &'a Option<String>, path: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("{path} is required for this provider"),
    }
}

pub fn build_recognizer(ocr: &OcrConfig) -> Result<Arc<dyn TextRecognizer>> {
    let model = |default: &str| ocr.model.clone().unwrap_or_else(|| default.to_string());
    let recognizer: Arc<dyn TextRecognizer> = match ocr.provider() {
        "google-vision" => Arc::new(
            GoogleVisionRecognizer::new(required(&ocr.api_key, "ocr.apiKey")?)
                .with_timeout(Duration::from_secs(ocr.timeout_secs())),
        ),
        "openai-vision" => Arc::new(VisionModelRecognizer::new(VisionProvider::openai(
            required(&ocr.api_key, "ocr.apiKey")?,
            model(DEFAULT_OPENAI_VISION_MODEL),
        ))),
        "gemini-vision" => Arc::new(VisionModelRecognizer::new(VisionProvider::gemini(
            required(&ocr.api_key, "ocr.apiKey")?,
            model(DEFAULT_GEMINI_VISION_MODEL),
        ))),
        // Recognizes nothing; pair with `extract --text`.
        "mock" => Arc::new(MockRecognizer::blank()),
        other => bail!("Unknown OCR provider '{other}'"),
    };
    Ok(recognizer)
}

fn text_provider(secondary: &SecondaryConfig, name: &str) -> Result<Arc<dyn LlmProvider>> {
    let timeout = Duration::from_secs(secondary.timeout_secs());
    let mut registry = ProviderRegistry::new();
    match name {
        "openrouter" => {
            let mut provider =
                OpenRouterProvider::new(required(&secondary.api_key, "secondary.apiKey")?)
                    .with_timeout(timeout);
            if let Some(url) = &secondary.base_url {
                provider = provider.with_base_url(url);
            }
            registry.register(Arc::new(provider));
        }
        "ollama" => {
            let mut provider = OllamaProvider::new().with_timeout(timeout);
            if let Some(url) = &secondary.base_url {
                provider = provider.with_base_url(url);
            }
            registry.register(Arc::new(provider));
        }
        "mock" => registry.register(Arc::new(MockProvider::new("mock"))),
        _ => {}
    }
    registry.get(name).with_context(|| {
        format!(
            "Unknown text provider '{name}'; expected one of {}",
            KNOWN_PROVIDERS.join(", ")
        )
    })
}

pub fn build_secondary(secondary: &SecondaryConfig) -> Result<Option<Arc<dyn CandidateExtractor>>> {
    if !secondary.enabled() {
        return Ok(None);
    }
    let provider = secondary
        .provider
        .as_deref()
        .context("secondary.provider is required when the secondary pass is enabled")?;
    let model = secondary.model.clone().unwrap_or_default();

    let extractor: Arc<dyn CandidateExtractor> = match secondary.input() {
        SecondaryInput::Text => Arc::new(TextModelExtractor::new(
            text_provider(secondary, provider)?,
            model,
        )),
        SecondaryInput::Image => {
            let api_key = required(&secondary.api_key, "secondary.apiKey")?;
            let vision = match (provider, &secondary.base_url) {
                ("openai-vision", Some(url)) => VisionProvider::openai_compatible(api_key, model, url),
                ("openai-vision", None) => VisionProvider::openai(api_key, model),
                ("gemini-vision", _) => VisionProvider::gemini(api_key, model),
                (other, _) => bail!("Provider '{other}' cannot read image input"),
            };
            Arc::new(VisionModelExtractor::new(vision))
        }
    };
    Ok(Some(extractor))
}

pub fn build_pipeline(config: &ChequeForgeConfig) -> Result<ChequePipeline> {
    let ocr = config.ocr();
    let secondary = config.secondary();

    let mut pipeline = ChequePipeline::new(build_recognizer(&ocr)?)
        .with_merge_policy(MergePolicy::preferring(secondary.prefer_secondary_fields()))
        .with_options(PipelineOptions {
            ocr_timeout: Duration::from_secs(ocr.timeout_secs()),
            secondary_timeout: Duration::from_secs(secondary.timeout_secs()),
        });
    if let Some(extractor) = build_secondary(&secondary)? {
        pipeline = pipeline.with_secondary(extractor);
    }

    info!(
        ocr = %pipeline.recognizer_name(),
        secondary = pipeline.secondary_name().unwrap_or("none"),
        "Pipeline ready"
    );
    Ok(pipeline)
}

pub fn open_store(config: &ChequeForgeConfig) -> Result<ChequeStore> {
    let path = config.storage().db_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }
    ChequeStore::open(&path).with_context(|| format!("Failed to open database {}", path.display()))
}

pub fn build_gateway_state(config: &ChequeForgeConfig) -> Result<GatewayState> {
    let server = config.server();
    let webhook = config.webhook();
    Ok(GatewayState {
        pipeline: Arc::new(build_pipeline(config)?),
        store: Arc::new(open_store(config)?),
        uploads: UploadDir::new(server.upload_dir()),
        webhook: webhook
            .url
            .as_deref()
            .map(|url| WebhookNotifier::new(url, Duration::from_secs(webhook.timeout_secs()))),
        events: ExtractionEventLogger,
        max_upload_bytes: server.max_upload_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chequeforge_config::apply_all_defaults;

    fn mock_config() -> ChequeForgeConfig {
        let mut config = ChequeForgeConfig::default();
        config.ocr = Some(OcrConfig {
            provider: Some("mock".into()),
            ..Default::default()
        });
        apply_all_defaults(config)
    }

    #[test]
    fn defaults_build_without_secondary() {
        let pipeline = build_pipeline(&mock_config()).unwrap();
        assert_eq!(pipeline.recognizer_name(), "mock-ocr");
        assert_eq!(pipeline.secondary_name(), None);
    }

    #[test]
    fn google_vision_needs_a_key() {
        let err = build_recognizer(&OcrConfig::default()).err().unwrap();
        assert!(err.to_string().contains("ocr.apiKey"));
    }

    #[test]
    fn text_secondary_uses_named_provider() {
        let mut config = mock_config();
        config.secondary = Some(SecondaryConfig {
            enabled: Some(true),
            provider: Some("ollama".into()),
            model: Some("llama3.2".into()),
            ..Default::default()
        });
        let pipeline = build_pipeline(&config).unwrap();
        assert_eq!(pipeline.secondary_name(), Some("ollama"));
    }

    #[test]
    fn image_secondary_uses_vision_model() {
        let secondary = SecondaryConfig {
            enabled: Some(true),
            provider: Some("gemini-vision".into()),
            model: Some("gemini-2.0-flash".into()),
            api_key: Some("k".into()),
            input: Some(SecondaryInput::Image),
            ..Default::default()
        };
        let extractor = build_secondary(&secondary).unwrap().unwrap();
        assert!(extractor.wants_image());
    }

    #[test]
    fn unknown_text_provider_is_rejected() {
        let secondary = SecondaryConfig {
            enabled: Some(true),
            provider: Some("anthropic".into()),
            model: Some("m".into()),
            ..Default::default()
        };
        let err = build_secondary(&secondary).err().unwrap();
        assert!(err.to_string().contains("openrouter, ollama, mock"));
    }

    #[test]
    fn gateway_state_wires_webhook() {
        let mut config = mock_config();
        let dir = std::env::temp_dir().join(format!("chequeforge-cli-{}", uuid::Uuid::new_v4()));
        config.storage = Some(chequeforge_config::StorageConfig {
            db_path: Some(dir.join("cheques.db")),
        });
        config.webhook = Some(chequeforge_config::WebhookConfig {
            url: Some("http://localhost:9/hook".into()),
            timeout_secs: None,
        });
        let state = build_gateway_state(&config).unwrap();
        assert_eq!(state.webhook.as_ref().map(|w| w.url()), Some("http://localhost:9/hook"));
        assert_eq!(state.max_upload_bytes, 10 * 1024 * 1024);
        let _ = std::fs::remove_dir_all(dir);
    }
}
