//! Uploaded cheque image storage.
//!
//! Files are stored as `<unix-millis>-<original name>` and served back under
//! `/uploads/`.

use std::path::{Path, PathBuf};

use chequeforge_core::{ChequeError, ChequeImage};
use chrono::Utc;
use tracing::{info, warn};

/// Public URL prefix the upload directory is mounted at.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

/// A stored upload: where it lives on disk and where clients fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedUpload {
    pub path: PathBuf,
    pub url: String,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(&self, image: &ChequeImage) -> Result<SavedUpload, ChequeError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ChequeError::Storage(format!("cannot create upload dir: {e}")))?;

        let name = stored_file_name(Utc::now().timestamp_millis(), &image.file_name);
        let path = self.root.join(&name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| ChequeError::Storage(format!("cannot write {}: {e}", path.display())))?;

        info!(path = %path.display(), bytes = image.bytes.len(), "Upload saved");
        Ok(SavedUpload {
            path,
            url: format!("{UPLOADS_ROUTE}/{name}"),
        })
    }

    /// Best-effort delete of an upload that produced no record.
    pub async fn remove(&self, saved: &SavedUpload) {
        if let Err(e) = tokio::fs::remove_file(&saved.path).await {
            warn!(path = %saved.path.display(), error = %e, "Failed to delete upload");
        }
    }
}

/// `<millis>-<name>`, with the client name reduced to a safe base name.
pub fn stored_file_name(millis: i64, original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = if cleaned.is_empty() { "cheque" } else { cleaned };
    format!("{millis}-{cleaned}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_prefixed_and_sanitized() {
        assert_eq!(stored_file_name(1718000000000, "cheque.jpg"), "1718000000000-cheque.jpg");
        assert_eq!(stored_file_name(1, "../../etc/passwd"), "1-passwd");
        assert_eq!(stored_file_name(1, "C:\\scans\\my cheque (1).png"), "1-my_cheque__1_.png");
        assert_eq!(stored_file_name(1, ".."), "1-cheque");
        assert_eq!(stored_file_name(1, ""), "1-cheque");
    }

    #[tokio::test]
    async fn save_and_remove() {
        let root = std::env::temp_dir().join(format!("chequeforge-uploads-{}", uuid::Uuid::new_v4()));
        let uploads = UploadDir::new(&root);
        let image = ChequeImage::from_bytes(vec![1, 2, 3], "image/png", "scan.png").unwrap();

        let saved = uploads.save(&image).await.unwrap();
        assert!(saved.url.starts_with("/uploads/"));
        assert!(saved.url.ends_with("-scan.png"));
        assert_eq!(std::fs::read(&saved.path).unwrap(), vec![1, 2, 3]);

        uploads.remove(&saved).await;
        assert!(!saved.path.exists());
        let _ = std::fs::remove_dir_all(root);
    }
}
