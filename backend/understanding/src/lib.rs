//! Concrete recognition and secondary-extraction capabilities.

pub mod candidate;
pub mod mock;
pub mod ocr;
pub mod vision;

pub use candidate::{TextModelExtractor, parse_candidate};
pub use mock::{MockCandidateExtractor, MockRecognizer};
pub use ocr::GoogleVisionRecognizer;
pub use vision::{VisionModelExtractor, VisionModelRecognizer, VisionProvider, describe_image};
