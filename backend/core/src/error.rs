use thiserror::Error;

/// Top-level error type for the ChequeForge pipeline and its collaborators.
///
/// Only the recognition and image variants are fatal to an extraction run;
/// the secondary-source variants are absorbed by the pipeline and surface as
/// review notes instead.
#[derive(Debug, Error)]
pub enum ChequeError {
    #[error("Could not extract any text from the image.")]
    NoText,

    #[error("text recognition failed ({provider}): {message}")]
    Recognition { provider: String, message: String },

    #[error("text recognition timed out after {0}s")]
    RecognitionTimeout(u64),

    #[error("secondary extraction failed ({provider}): {message}")]
    Secondary { provider: String, message: String },

    #[error("secondary extraction timed out after {0}s")]
    SecondaryTimeout(u64),

    #[error("secondary extraction returned no parseable result: {0}")]
    MalformedCandidate(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("cheque not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChequeError {
    /// Whether this error means the pipeline could not produce a record at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ChequeError::NoText
                | ChequeError::Recognition { .. }
                | ChequeError::RecognitionTimeout(_)
                | ChequeError::InvalidImage(_)
        )
    }
}
