//! Pipeline orchestrator: image in, finished record out.
//!
//! normalize → primary extractors → secondary pass (once) → merge →
//! aggregate. Only a recognition failure escapes as an error.

use std::sync::Arc;
use std::time::Duration;

use chequeforge_core::{
    CandidateExtractor, CandidateRequest, ChequeError, ChequeExtraction, ChequeImage, TextRecognizer,
};
use tracing::{debug, info, instrument, warn};

use crate::aggregator::{SecondaryStatus, aggregate};
use crate::extractors::extract_primary;
use crate::merge::MergePolicy;
use crate::normalizer::ChequeText;
use crate::secondary::{CANDIDATE_INSTRUCTION, SecondaryOutcomes};

/// Timeouts for the two external calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub ocr_timeout: Duration,
    pub secondary_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            ocr_timeout: Duration::from_secs(30),
            secondary_timeout: Duration::from_secs(20),
        }
    }
}

/// A finished record and how the secondary pass went.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub record: ChequeExtraction,
    pub secondary: SecondaryStatus,
}

/// One extraction pipeline, shareable across concurrent requests.
#[derive(Clone)]
pub struct ChequePipeline {
    recognizer: Arc<dyn TextRecognizer>,
    secondary: Option<Arc<dyn CandidateExtractor>>,
    merge_policy: MergePolicy,
    options: PipelineOptions,
}

impl ChequePipeline {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            secondary: None,
            merge_policy: MergePolicy::default(),
            options: PipelineOptions::default(),
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn CandidateExtractor>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Drop the secondary source, keeping everything else.
    pub fn without_secondary(mut self) -> Self {
        self.secondary = None;
        self
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    pub fn secondary_name(&self) -> Option<&str> {
        self.secondary.as_deref().map(|s| s.name())
    }

    /// Recognize the image and extract every field.
    pub async fn extract(&self, image: &ChequeImage) -> Result<ChequeExtraction, ChequeError> {
        self.run(image).await.map(|run| run.record)
    }

    /// Extract from already-recognized text. Never fails.
    pub async fn extract_text(&self, raw: &str, image: Option<&ChequeImage>) -> ChequeExtraction {
        self.run_text(raw, image).await.record
    }

    /// Like [`extract`](Self::extract), also reporting the secondary pass.
    #[instrument(skip(self, image), fields(file = %image.file_name, ocr = %self.recognizer.name()))]
    pub async fn run(&self, image: &ChequeImage) -> Result<PipelineRun, ChequeError> {
        let timeout = self.options.ocr_timeout;
        let raw = tokio::time::timeout(timeout, self.recognizer.recognize(image))
            .await
            .map_err(|_| ChequeError::RecognitionTimeout(timeout.as_secs()))??;

        if raw.trim().is_empty() {
            return Err(ChequeError::NoText);
        }
        debug!(chars = raw.len(), "text recognized");

        Ok(self.run_text(&raw, Some(image)).await)
    }

    pub async fn run_text(&self, raw: &str, image: Option<&ChequeImage>) -> PipelineRun {
        let text = ChequeText::new(raw);
        let primary = extract_primary(&text);

        let (secondary, status) = self.run_secondary(&text, image).await;
        let merged = self.merge_policy.merge(primary, secondary);
        let verdict = aggregate(&merged, &status);

        let mut record = merged.into_record(text.into_text());
        verdict.apply_to(&mut record);

        info!(
            needs_review = record.needs_review,
            notes = record.review_notes.len(),
            "cheque extracted"
        );
        PipelineRun {
            record,
            secondary: status,
        }
    }

    async fn run_secondary(
        &self,
        text: &ChequeText,
        image: Option<&ChequeImage>,
    ) -> (Option<SecondaryOutcomes>, SecondaryStatus) {
        let Some(source) = &self.secondary else {
            return (None, SecondaryStatus::NotConfigured);
        };
        let name = source.name().to_string();
        let failed = |message: String| {
            warn!(source = %name, %message, "secondary extraction failed");
            (
                None,
                SecondaryStatus::Failed {
                    source: name.clone(),
                    message,
                },
            )
        };

        if source.wants_image() && image.is_none() {
            return failed("no image available for a vision source".into());
        }

        let request = CandidateRequest {
            text: text.text(),
            image,
            instruction: CANDIDATE_INSTRUCTION,
        };
        let timeout = self.options.secondary_timeout;
        let candidate = match tokio::time::timeout(timeout, source.infer(&request)).await {
            Err(_) => return failed(ChequeError::SecondaryTimeout(timeout.as_secs()).to_string()),
            Ok(Err(e)) => return failed(e.to_string()),
            Ok(Ok(candidate)) => candidate,
        };
        if candidate.is_empty() {
            return failed("returned no usable fields".into());
        }

        debug!(source = %name, "secondary candidate accepted");
        (
            Some(SecondaryOutcomes::from_candidate(&candidate)),
            SecondaryStatus::Succeeded { source: name.clone() },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chequeforge_core::{CandidateField, ChequeField, StructuredCandidate};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    const WELL_FORMED: &str = "MAYBANK BERHAD 14-27015
BAYAR / PAY John Doe ATAU PEMBAWA / OR BEARER
RINGGIT MALAYSIA ONE THOUSAND TWO HUNDRED FIFTY ONLY
RM 1,250.00
Date: 15/06/2024
LIM ENTERPRISE SDN BHD
AUTHORISED SIGNATURE
Please do not write or sign below this line
⑈123456⑈ 1234567⑆ 0123456789⑈ 10";

    struct StaticText(&'static str);

    #[async_trait]
    impl TextRecognizer for StaticText {
        fn name(&self) -> &str {
            "static"
        }

        async fn recognize(&self, _image: &ChequeImage) -> Result<String, ChequeError> {
            Ok(self.0.to_string())
        }
    }

    struct SlowText;

    #[async_trait]
    impl TextRecognizer for SlowText {
        fn name(&self) -> &str {
            "slow"
        }

        async fn recognize(&self, _image: &ChequeImage) -> Result<String, ChequeError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("PAY late".into())
        }
    }

    enum Secondary {
        Answer(StructuredCandidate),
        Fail,
        Hang,
    }

    #[async_trait]
    impl CandidateExtractor for Secondary {
        fn name(&self) -> &str {
            "stub-model"
        }

        async fn infer(&self, _request: &CandidateRequest<'_>) -> Result<StructuredCandidate, ChequeError> {
            match self {
                Secondary::Answer(c) => Ok(c.clone()),
                Secondary::Fail => Err(ChequeError::Secondary {
                    provider: "stub-model".into(),
                    message: "connection refused".into(),
                }),
                Secondary::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(StructuredCandidate::default())
                }
            }
        }
    }

    fn image() -> ChequeImage {
        ChequeImage::from_bytes(vec![0xFF, 0xD8], "image/jpeg", "cheque.jpg").unwrap()
    }

    fn pipeline(text: &'static str) -> ChequePipeline {
        ChequePipeline::new(Arc::new(StaticText(text))).with_options(PipelineOptions {
            ocr_timeout: Duration::from_millis(200),
            secondary_timeout: Duration::from_millis(200),
        })
    }

    #[tokio::test]
    async fn well_formed_cheque_needs_no_review() {
        let record = pipeline(WELL_FORMED).extract(&image()).await.unwrap();
        assert_eq!(record.payee_name.as_deref(), Some("John Doe"));
        assert_eq!(record.amount, Some(Decimal::new(125000, 2)));
        assert_eq!(record.amount_in_words.as_deref(), Some("ONE THOUSAND TWO HUNDRED FIFTY"));
        assert_eq!(record.cheque_date, NaiveDate::from_ymd_opt(2024, 6, 15));
        assert_eq!(record.payer_name.as_deref(), Some("LIM ENTERPRISE SDN BHD"));
        assert_eq!(record.bank_branch_code_center.as_deref(), Some("14-27015"));
        assert_eq!(record.micr.cheque_no.as_deref(), Some("123456"));
        assert!(!record.needs_review, "notes: {:?}", record.review_notes);
        assert!(!record.raw_text.contains("below this line"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["chequeDate"], "15-06-2024");
    }

    #[tokio::test]
    async fn missing_micr_line_is_flagged() {
        let text = "PAY John Doe\nRINGGIT MALAYSIA TEN ONLY\nRM 10.00\nDate: 15/06/2024\nJANE TAN\nSIGNATURE";
        let record = pipeline(text).extract(&image()).await.unwrap();
        assert!(record.micr.raw.is_none());
        assert!(record.needs_review);
        assert!(record.review_notes.iter().any(|n| n.starts_with("MICR line unparsable")));
    }

    #[tokio::test]
    async fn partial_secondary_micr_is_reviewed() {
        let text = "PAY John Doe\nRINGGIT MALAYSIA TEN ONLY\nRM 10.00\nDate: 15/06/2024\nJANE TAN\nSIGNATURE";
        let mut candidate = StructuredCandidate::default();
        candidate.micr.cheque_no = CandidateField::value("123456");
        candidate.micr.payer_account_no = CandidateField::value("0123456789");

        let record = pipeline(text)
            .with_secondary(Arc::new(Secondary::Answer(candidate)))
            .extract(&image())
            .await
            .unwrap();
        assert_eq!(record.micr.raw.as_deref(), Some("123456 0123456789"));
        assert!(!record.is_unknown(ChequeField::Micr));
        assert!(record.needs_review);
        assert!(record
            .review_notes
            .iter()
            .any(|n| n.starts_with("Low confidence (60) for MICR line")));
    }

    #[tokio::test]
    async fn low_secondary_confidence_on_a_primary_field_is_reviewed() {
        let candidate = StructuredCandidate {
            payee_name: CandidateField::value("Jane Roe").with_confidence(20),
            ..Default::default()
        };
        let record = pipeline(WELL_FORMED)
            .with_secondary(Arc::new(Secondary::Answer(candidate)))
            .extract(&image())
            .await
            .unwrap();
        assert_eq!(record.payee_name.as_deref(), Some("John Doe"));
        assert!(record.needs_review);
        assert_eq!(record.review_notes.len(), 1);
        assert!(record
            .review_notes
            .iter()
            .any(|n| n.starts_with("Low secondary confidence (20) for payee name")));
    }

    #[tokio::test]
    async fn no_text_is_fatal() {
        let err = pipeline("  \n ").extract(&image()).await.unwrap_err();
        assert!(matches!(err, ChequeError::NoText));
    }

    #[tokio::test]
    async fn recognition_timeout_is_fatal() {
        let pipeline = ChequePipeline::new(Arc::new(SlowText)).with_options(PipelineOptions {
            ocr_timeout: Duration::from_millis(20),
            secondary_timeout: Duration::from_millis(20),
        });
        let err = pipeline.extract(&image()).await.unwrap_err();
        assert!(matches!(err, ChequeError::RecognitionTimeout(_)));
    }

    #[tokio::test]
    async fn secondary_failure_keeps_primary_result_and_adds_a_note() {
        let baseline = pipeline(WELL_FORMED).extract_text(WELL_FORMED, None).await;

        for secondary in [Secondary::Fail, Secondary::Hang] {
            let record = pipeline(WELL_FORMED)
                .with_secondary(Arc::new(secondary))
                .extract(&image())
                .await
                .unwrap();
            assert!(record.needs_review);
            assert_eq!(record.review_notes.len(), 1);
            assert!(record.review_notes.iter().next().unwrap().starts_with("Secondary extraction (stub-model) failed"));

            let mut stripped = record.clone();
            stripped.review_notes.clear();
            stripped.needs_review = false;
            assert_eq!(stripped, baseline);
        }
    }

    #[tokio::test]
    async fn secondary_fills_gaps_only() {
        let text = "PAY John Doe\nRM 1,250.00\nDate: 15/06/2024";
        let candidate = StructuredCandidate {
            payee_name: CandidateField::value("Johnny D"),
            amount_in_words: CandidateField::value("one thousand two hundred fifty").with_confidence(95),
            ..Default::default()
        };
        let record = pipeline(text)
            .with_secondary(Arc::new(Secondary::Answer(candidate)))
            .extract(&image())
            .await
            .unwrap();
        assert_eq!(record.payee_name.as_deref(), Some("John Doe"));
        assert_eq!(record.amount_in_words.as_deref(), Some("ONE THOUSAND TWO HUNDRED FIFTY"));
    }

    #[tokio::test]
    async fn preferred_field_comes_from_secondary() {
        let candidate = StructuredCandidate {
            payer_name: CandidateField::value("Lim Enterprise Sdn. Bhd.").with_confidence(96),
            ..Default::default()
        };
        let record = pipeline(WELL_FORMED)
            .with_secondary(Arc::new(Secondary::Answer(candidate)))
            .with_merge_policy(MergePolicy::preferring([ChequeField::PayerName]))
            .extract(&image())
            .await
            .unwrap();
        assert_eq!(record.payer_name.as_deref(), Some("Lim Enterprise Sdn. Bhd."));
        assert!(!record.needs_review);
    }

    #[tokio::test]
    async fn empty_candidate_counts_as_failure() {
        let record = pipeline(WELL_FORMED)
            .with_secondary(Arc::new(Secondary::Answer(StructuredCandidate::default())))
            .extract(&image())
            .await
            .unwrap();
        assert!(record.needs_review);
        assert!(record.review_notes.iter().any(|n| n.contains("no usable fields")));
    }

    #[tokio::test]
    async fn run_reports_secondary_status() {
        let run = pipeline(WELL_FORMED).run(&image()).await.unwrap();
        assert_eq!(run.secondary, SecondaryStatus::NotConfigured);

        let run = pipeline(WELL_FORMED)
            .with_secondary(Arc::new(Secondary::Fail))
            .run(&image())
            .await
            .unwrap();
        match run.secondary {
            SecondaryStatus::Failed { source, message } => {
                assert_eq!(source, "stub-model");
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
