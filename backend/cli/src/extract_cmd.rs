//! CLI Extract Command
//!
//! Runs the pipeline over one image and prints the record as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use chequeforge_config::ChequeForgeConfig;
use chequeforge_core::{ChequeError, ChequeExtraction, ChequeImage};

use crate::terminal_output::note_warn;
use crate::wiring::build_pipeline;

pub async fn run(
    config: &ChequeForgeConfig,
    image: &Path,
    text: Option<&Path>,
    no_secondary: bool,
) -> Result<()> {
    let record = extract(config, image, text, no_secondary).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    if record.needs_review {
        for note in record.review_notes.iter() {
            note_warn(note);
        }
    }
    Ok(())
}

/// With `text`, the file's contents stand in for the recognizer output.
pub async fn extract(
    config: &ChequeForgeConfig,
    image: &Path,
    text: Option<&Path>,
    no_secondary: bool,
) -> Result<ChequeExtraction> {
    let image = ChequeImage::from_path(image).await?;
    let mut pipeline = build_pipeline(config)?;
    if no_secondary {
        pipeline = pipeline.without_secondary();
    }

    let Some(text_path) = text else {
        return Ok(pipeline.extract(&image).await?);
    };
    let raw = tokio::fs::read_to_string(text_path)
        .await
        .with_context(|| format!("Failed to read text file: {}", text_path.display()))?;
    if raw.trim().is_empty() {
        return Err(ChequeError::NoText.into());
    }
    Ok(pipeline.extract_text(&raw, Some(&image)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chequeforge_config::{apply_all_defaults, OcrConfig};

    const CHEQUE_TEXT: &str = "MAYBANK BERHAD 14-27015
BAYAR / PAY John Doe ATAU PEMBAWA / OR BEARER
RINGGIT MALAYSIA ONE THOUSAND TWO HUNDRED FIFTY ONLY
RM 1,250.00
Date: 15/06/2024
LIM ENTERPRISE SDN BHD
AUTHORISED SIGNATURE
Please do not write or sign below this line
⑈123456⑈ 1234567⑆ 0123456789⑈ 10";

    fn mock_config() -> ChequeForgeConfig {
        let mut config = ChequeForgeConfig::default();
        config.ocr = Some(OcrConfig {
            provider: Some("mock".into()),
            ..Default::default()
        });
        apply_all_defaults(config)
    }

    fn scratch() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("chequeforge-extract-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn text_file_replaces_recognizer() {
        let dir = scratch();
        let image = dir.join("cheque.png");
        let text = dir.join("cheque.txt");
        std::fs::write(&image, b"\x89PNG").unwrap();
        std::fs::write(&text, CHEQUE_TEXT).unwrap();

        let record = extract(&mock_config(), &image, Some(&text), true).await.unwrap();
        assert_eq!(record.payee_name.as_deref(), Some("John Doe"));
        assert_eq!(record.micr.cheque_no.as_deref(), Some("123456"));
        assert!(!record.needs_review, "notes: {:?}", record.review_notes);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn blank_text_is_no_text() {
        let dir = scratch();
        let image = dir.join("cheque.png");
        let text = dir.join("cheque.txt");
        std::fs::write(&image, b"\x89PNG").unwrap();
        std::fs::write(&text, "  \n").unwrap();

        let err = extract(&mock_config(), &image, Some(&text), false).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ChequeError>(), Some(ChequeError::NoText)));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn mock_recognizer_without_text_fails() {
        let dir = scratch();
        let image = dir.join("cheque.jpg");
        std::fs::write(&image, b"\xff\xd8").unwrap();

        let err = extract(&mock_config(), &image, None, false).await.unwrap_err();
        assert!(err.to_string().contains("Could not extract any text"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
