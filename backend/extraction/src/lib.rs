//! Cheque field extraction.
//!
//! Raw OCR text flows through [`normalizer`], then every extractor in
//! [`extractors`] plus the [`micr`] decoder runs over the same immutable text.
//! An optional model pass is reconciled by [`merge`], and [`aggregator`]
//! decides whether the record needs a human. [`pipeline`] sequences it all.

pub mod aggregator;
pub mod anchor;
pub mod extractors;
pub mod merge;
pub mod micr;
pub mod normalizer;
pub mod pipeline;
pub mod secondary;

pub use aggregator::{CONFIDENCE_THRESHOLD, ReviewVerdict, SecondaryStatus, aggregate};
pub use extractors::{PrimaryOutcomes, extract_primary};
pub use merge::{Merged, MergePolicy, MergedFields, SecondaryScore};
pub use micr::decode_micr;
pub use normalizer::{ChequeText, normalize};
pub use pipeline::{ChequePipeline, PipelineOptions, PipelineRun};
pub use secondary::{CANDIDATE_INSTRUCTION, SecondaryOutcomes};
