//! CLI Config Command
//!
//! Show, validate, or scaffold the config file.

use std::path::Path;

use anyhow::{bail, Result};
use chequeforge_config::{
    apply_all_defaults, load_config, load_raw, redact, validate, write_config, ChequeForgeConfig,
};

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

/// Print the effective config with secrets masked.
pub async fn show(path: &Path) -> Result<()> {
    note_info(&format!("Config file: {}", path.display()));
    print!("{}", render_redacted(path).await?);
    Ok(())
}

/// The file as written on disk, defaults applied and secrets masked.
/// Env references stay unresolved so `show` works before they are exported.
pub async fn render_redacted(path: &Path) -> Result<String> {
    let raw = load_raw(path).await?;
    let config: ChequeForgeConfig = serde_json::from_value(raw)?;
    let effective = serde_json::to_value(apply_all_defaults(config))?;
    Ok(serde_yaml::to_string(&redact(&effective))?)
}

pub async fn validate_file(path: &Path) -> Result<()> {
    let config = apply_all_defaults(load_config(path).await?);
    let report = validate(&config);

    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    if !report.is_valid() {
        bail!("{} validation error(s) in {}", report.errors.len(), path.display());
    }
    note_success(&format!("{} is valid", path.display()));
    Ok(())
}

/// Write a config holding every default. Refuses to clobber without `force`.
pub async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite (the old file is kept as a backup)",
            path.display()
        );
    }
    write_config(&apply_all_defaults(ChequeForgeConfig::default()), path).await?;
    note_success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}
