//! Config file location, loading, and atomic writes with backup rotation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::env::resolve_env_vars;
use crate::schema::ChequeForgeConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 5;

/// Resolve the config directory.
/// Priority: `CHEQUEFORGE_CONFIG_DIR` env > `~/.chequeforge/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHEQUEFORGE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".chequeforge"),
        None => PathBuf::from(".chequeforge"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the YAML file as a JSON value tree, before env substitution.
///
/// A missing file is an empty document.
pub async fn load_raw(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))
}

/// Load the config, substituting `${VAR}` references.
///
/// Substitution runs on the untyped tree so numeric fields may be supplied
/// through the environment too.
pub async fn load_config(path: &Path) -> Result<ChequeForgeConfig> {
    let raw = load_raw(path).await?;
    let resolved = resolve_env_vars(&raw)
        .with_context(|| format!("Failed to resolve env vars in {}", path.display()))?;
    let config = parse_resolved(resolved)
        .with_context(|| format!("Invalid config at: {}", path.display()))?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Deserialize a substituted tree, coercing numeric-looking strings that
/// came from the environment.
fn parse_resolved(value: Value) -> Result<ChequeForgeConfig> {
    let value = coerce_numeric_strings(value);
    Ok(serde_json::from_value(value)?)
}

fn coerce_numeric_strings(value: Value) -> Value {
    match value {
        Value::String(s) => match s.parse::<u64>() {
            Ok(n) if !s.starts_with('0') || s == "0" => Value::from(n),
            _ => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
        },
        Value::Array(arr) => Value::Array(arr.into_iter().map(coerce_numeric_strings).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, coerce_numeric_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Write config to disk atomically (write to temp file, rename).
///
/// Creates a rolling backup of the previous config before overwriting.
pub async fn write_config(config: &ChequeForgeConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// Rotate backup files: config.yaml.bak.1 → .bak.2 → ... → .bak.N
async fn rotate_backups(path: &Path) {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{i}"));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!("Failed to rotate backup {}: {}", old.display(), e);
            }
        }
    }

    let bak = path.with_extension("yaml.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!("Failed to create backup {}: {}", bak.display(), e);
    }
}
