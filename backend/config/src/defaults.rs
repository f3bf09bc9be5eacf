//! Config defaults: applies default values to a parsed config so a dumped
//! config shows what is actually in effect.

use chequeforge_core::ChequeField;

use crate::schema::{
    ChequeForgeConfig, LoggingConfig, OcrConfig, SecondaryConfig, ServerConfig, StorageConfig,
};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_OCR_PROVIDER: &str = "google-vision";
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_SECONDARY_TIMEOUT_SECS: u64 = 20;

pub const DEFAULT_DB_PATH: &str = "chequeforge.db";
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Signer names are too free-form to anchor reliably.
pub const DEFAULT_PREFER_SECONDARY: [ChequeField; 1] = [ChequeField::PayerName];

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ChequeForgeConfig) -> ChequeForgeConfig {
    let config = apply_server_defaults(config);
    let config = apply_ocr_defaults(config);
    let config = apply_secondary_defaults(config);
    let config = apply_storage_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: ChequeForgeConfig) -> ChequeForgeConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.host.get_or_insert_with(|| DEFAULT_HOST.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server.upload_dir.get_or_insert_with(|| DEFAULT_UPLOAD_DIR.into());
    server.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    config
}

fn apply_ocr_defaults(mut config: ChequeForgeConfig) -> ChequeForgeConfig {
    let ocr = config.ocr.get_or_insert_with(OcrConfig::default);
    ocr.provider.get_or_insert_with(|| DEFAULT_OCR_PROVIDER.to_string());
    ocr.timeout_secs.get_or_insert(DEFAULT_OCR_TIMEOUT_SECS);
    config
}

/// The secondary pass stays disabled unless configured; its tuning knobs
/// still get defaults so enabling it needs only a provider and model.
fn apply_secondary_defaults(mut config: ChequeForgeConfig) -> ChequeForgeConfig {
    let secondary = config.secondary.get_or_insert_with(SecondaryConfig::default);
    secondary.enabled.get_or_insert(false);
    secondary.input.get_or_insert_with(Default::default);
    secondary.timeout_secs.get_or_insert(DEFAULT_SECONDARY_TIMEOUT_SECS);
    secondary.prefer_secondary.get_or_insert_with(|| {
        DEFAULT_PREFER_SECONDARY
            .iter()
            .map(|f| f.key().to_string())
            .collect()
    });
    config
}

fn apply_storage_defaults(mut config: ChequeForgeConfig) -> ChequeForgeConfig {
    let storage = config.storage.get_or_insert_with(StorageConfig::default);
    storage.db_path.get_or_insert_with(|| DEFAULT_DB_PATH.into());
    config
}

fn apply_logging_defaults(mut config: ChequeForgeConfig) -> ChequeForgeConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.into());
    config
}
