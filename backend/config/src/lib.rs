//! `chequeforge-config` — ChequeForge runtime configuration management.
//!
//! Provides:
//! - Typed config schema (server, recognition, secondary pass, storage, webhook, logging)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe logging/display
//! - Default value application
//! - Cross-field validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_raw, write_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    ChequeForgeConfig, LoggingConfig, OcrConfig, SecondaryConfig, SecondaryInput, ServerConfig,
    StorageConfig, WebhookConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Load, substitute env vars, apply defaults and validate a config file.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<ChequeForgeConfig> {
    let config = load_config(path).await?;
    prepare(config).with_context(|| format!("Invalid config at {}", path.display()))
}

/// Apply defaults and validate an already-loaded config.
///
/// Warnings are logged; any validation error aborts.
pub fn prepare(config: ChequeForgeConfig) -> Result<ChequeForgeConfig> {
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{} validation error(s); first: {}", report.errors.len(), first);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepares_file_with_env_and_defaults() {
        let dir = std::env::temp_dir().join(format!("chequeforge-prep-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::env::set_var("CHEQUEFORGE_TEST_PORT", "6100");
        std::fs::write(
            &path,
            "server:\n  port: ${CHEQUEFORGE_TEST_PORT}\nocr:\n  provider: mock\n",
        )
        .unwrap();

        let cfg = load_and_prepare(&path).await.unwrap();
        assert_eq!(cfg.server().port(), 6100);
        assert_eq!(cfg.storage().db_path(), std::path::PathBuf::from("chequeforge.db"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let dir = std::env::temp_dir().join(format!("chequeforge-prep-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(&path, "ocr:\n  provider: tesseract\n").unwrap();

        let err = format!("{:#}", load_and_prepare(&path).await.unwrap_err());
        assert!(err.contains("ocr.provider"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
