//! `chequeforge-core` — shared data model and capability seams for cheque extraction.
//!
//! Every other crate in the workspace depends on these types: the extraction
//! pipeline produces them, the understanding crate implements the traits,
//! and the store / gateway persist and serve the finished records.

pub mod candidate;
pub mod error;
pub mod outcome;
pub mod review;
pub mod sentinel;
pub mod traits;
pub mod types;

pub use candidate::{CandidateField, MicrCandidate, StructuredCandidate};
pub use error::ChequeError;
pub use outcome::{ExtractionOutcome, FieldSource};
pub use review::ReviewNotes;
pub use sentinel::UNKNOWN;
pub use traits::{
    CandidateExtractor, CandidateRequest, LlmProvider, LlmRequest, LlmResponse, TextRecognizer,
};
pub use types::{ChequeExtraction, ChequeField, ChequeImage, MicrBlock};
