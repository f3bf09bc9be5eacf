//! Config validation: cross-field checks with user-friendly error messages.

use std::str::FromStr;

use chequeforge_core::ChequeField;
use thiserror::Error;

use crate::schema::{ChequeForgeConfig, SecondaryInput};

/// Recognition back-ends the CLI knows how to build.
pub const OCR_PROVIDERS: &[&str] = &["google-vision", "openai-vision", "gemini-vision", "mock"];
/// Secondary providers reading normalized text.
pub const TEXT_SECONDARY_PROVIDERS: &[&str] = &["openrouter", "ollama", "mock"];
/// Secondary providers reading the image.
pub const IMAGE_SECONDARY_PROVIDERS: &[&str] = &["openai-vision", "gemini-vision"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ChequeForgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_ocr(config, &mut report);
    validate_secondary(config, &mut report);
    validate_webhook(config, &mut report);
    report
}

fn validate_server(config: &ChequeForgeConfig, report: &mut ValidationReport) {
    let server = config.server();
    if server.port() == 0 {
        report.error("server.port", "Port must be non-zero");
    } else if server.port() < 1024 {
        report.warn("server.port", "Privileged port; binding may require elevated permissions");
    }
    if server.max_upload_bytes() == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be greater than zero");
    }
}

fn validate_ocr(config: &ChequeForgeConfig, report: &mut ValidationReport) {
    let ocr = config.ocr();
    let provider = ocr.provider();
    if !OCR_PROVIDERS.contains(&provider) {
        report.error(
            "ocr.provider",
            format!("Unknown provider '{provider}'; expected one of {}", OCR_PROVIDERS.join(", ")),
        );
    }
    if provider != "mock" && ocr.api_key.as_deref().map_or(true, str::is_empty) {
        report.warn("ocr.apiKey", "No API key configured; recognition calls will fail");
    }
    if ocr.timeout_secs() == 0 {
        report.error("ocr.timeoutSecs", "Timeout must be greater than zero");
    }
}

fn validate_secondary(config: &ChequeForgeConfig, report: &mut ValidationReport) {
    let secondary = config.secondary();

    if let Some(names) = &secondary.prefer_secondary {
        for name in names {
            if ChequeField::from_str(name).is_err() {
                report.error("secondary.preferSecondary", format!("Unknown field '{name}'"));
            }
        }
    }
    if secondary.timeout_secs() == 0 {
        report.error("secondary.timeoutSecs", "Timeout must be greater than zero");
    }

    if !secondary.enabled() {
        return;
    }

    let Some(provider) = secondary.provider.as_deref() else {
        report.error("secondary.provider", "Secondary pass is enabled but no provider is set");
        return;
    };
    let allowed = match secondary.input() {
        SecondaryInput::Text => TEXT_SECONDARY_PROVIDERS,
        SecondaryInput::Image => IMAGE_SECONDARY_PROVIDERS,
    };
    if !allowed.contains(&provider) {
        report.error(
            "secondary.provider",
            format!(
                "Provider '{provider}' cannot read {:?} input; expected one of {}",
                secondary.input(),
                allowed.join(", ")
            ),
        );
    }
    if provider != "mock" && secondary.model.as_deref().map_or(true, str::is_empty) {
        report.error("secondary.model", "Secondary pass is enabled but no model is set");
    }
}

fn validate_webhook(config: &ChequeForgeConfig, report: &mut ValidationReport) {
    let Some(webhook) = &config.webhook else { return };
    match webhook.url.as_deref() {
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            report.error("webhook.url", "Webhook URL must start with http:// or https://");
        }
        None => report.warn("webhook", "Webhook section present without a url; notifications are off"),
        _ => {}
    }
    if webhook.timeout_secs() == 0 {
        report.error("webhook.timeoutSecs", "Timeout must be greater than zero");
    }
}
