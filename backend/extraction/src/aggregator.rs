//! Record-level review decision.
//!
//! Runs once, after merging, over the final per-field outcomes, the scores
//! of secondary values the primary pass overruled, and the secondary pass
//! status. Each triggering condition yields exactly one note.

use chequeforge_core::{ChequeExtraction, ReviewNotes};

use crate::merge::MergedFields;

/// Confidence strictly below this forces review.
pub const CONFIDENCE_THRESHOLD: u8 = 90;

const NO_RATIONALE: &str = "no rationale given";

/// What happened to the secondary pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryStatus {
    /// No secondary source is configured.
    NotConfigured,
    Succeeded { source: String },
    /// Invoked and failed, timed out, or returned nothing usable.
    Failed { source: String, message: String },
}

impl SecondaryStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome of aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewVerdict {
    pub needs_review: bool,
    pub notes: ReviewNotes,
}

impl ReviewVerdict {
    /// Stamp the verdict onto a record. Notes merge with set semantics, so
    /// applying the same verdict twice changes nothing.
    pub fn apply_to(&self, record: &mut ChequeExtraction) {
        for note in self.notes.iter() {
            record.review_notes.insert(note);
        }
        record.needs_review = self.needs_review || !record.review_notes.is_empty();
    }
}

/// Decide whether the merged record needs a human.
pub fn aggregate(fields: &MergedFields, secondary: &SecondaryStatus) -> ReviewVerdict {
    let mut notes = ReviewNotes::new();

    for status in fields.statuses() {
        let label = status.field.label();
        if let Some(reason) = status.reason {
            if status.field.is_mandatory() {
                notes.insert(reason);
            }
        } else if let Some(confidence) = status.confidence.filter(|c| *c < CONFIDENCE_THRESHOLD) {
            let rationale = status.rationale.unwrap_or(NO_RATIONALE);
            notes.insert(format!("Low confidence ({confidence}) for {label}: {rationale}"));
        }

        if let Some(score) = status.overruled.filter(|s| s.confidence < CONFIDENCE_THRESHOLD) {
            let rationale = score.rationale.as_deref().unwrap_or(NO_RATIONALE);
            notes.insert(format!(
                "Low secondary confidence ({}) for {label}: {rationale}",
                score.confidence
            ));
        }
    }

    if let SecondaryStatus::Failed { source, message } = secondary {
        notes.insert(format!("Secondary extraction ({source}) failed: {message}"));
    }

    ReviewVerdict {
        needs_review: !notes.is_empty(),
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chequeforge_core::{ExtractionOutcome, MicrBlock};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::merge::{Merged, SecondaryScore};

    fn primary<T>(outcome: ExtractionOutcome<T>) -> Merged<T> {
        Merged::primary(outcome)
    }

    fn complete() -> MergedFields {
        MergedFields {
            payee_name: primary(ExtractionOutcome::found("John Doe".into())),
            payer_name: primary(ExtractionOutcome::found("LIM ENTERPRISE".into())),
            amount: primary(ExtractionOutcome::found(Decimal::new(125000, 2))),
            amount_in_words: primary(ExtractionOutcome::found("ONE THOUSAND".into())),
            cheque_date: primary(ExtractionOutcome::found(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())),
            bank_branch_code_center: primary(ExtractionOutcome::not_found("no code")),
            micr: primary(ExtractionOutcome::found(MicrBlock::default())),
        }
    }

    #[test]
    fn clean_record_needs_no_review() {
        let verdict = aggregate(&complete(), &SecondaryStatus::NotConfigured);
        assert!(!verdict.needs_review);
        assert!(verdict.notes.is_empty());
    }

    #[test]
    fn mandatory_gap_surfaces_reason_verbatim() {
        let mut fields = complete();
        fields.micr = primary(ExtractionOutcome::not_found("MICR line unparsable."));
        let verdict = aggregate(&fields, &SecondaryStatus::NotConfigured);
        assert!(verdict.needs_review);
        assert!(verdict.notes.contains("MICR line unparsable."));
    }

    #[test]
    fn low_confidence_triggers_review() {
        let mut fields = complete();
        fields.cheque_date = primary(ExtractionOutcome::graded(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            85,
            "month '83' read as '3'",
        ));
        let verdict = aggregate(&fields, &SecondaryStatus::NotConfigured);
        assert!(verdict.needs_review);
        assert!(verdict.notes.contains("Low confidence (85) for cheque date: month '83' read as '3'"));

        fields.cheque_date = primary(ExtractionOutcome::graded(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            90,
            "fine",
        ));
        assert!(!aggregate(&fields, &SecondaryStatus::NotConfigured).needs_review);
    }

    #[test]
    fn overruled_low_secondary_score_triggers_review() {
        let mut fields = complete();
        fields.payee_name.overruled = Some(SecondaryScore {
            confidence: 20,
            rationale: Some("name partly covered by stamp".into()),
        });
        let verdict = aggregate(&fields, &SecondaryStatus::Succeeded { source: "openrouter".into() });
        assert!(verdict.needs_review);
        assert!(verdict
            .notes
            .contains("Low secondary confidence (20) for payee name: name partly covered by stamp"));

        fields.payee_name.overruled = Some(SecondaryScore {
            confidence: 95,
            rationale: None,
        });
        assert!(!aggregate(&fields, &SecondaryStatus::NotConfigured).needs_review);
    }

    #[test]
    fn secondary_failure_triggers_review() {
        let status = SecondaryStatus::Failed {
            source: "openrouter".into(),
            message: "timed out after 20s".into(),
        };
        let verdict = aggregate(&complete(), &status);
        assert!(verdict.needs_review);
        assert_eq!(verdict.notes.len(), 1);
    }

    #[test]
    fn identical_reasons_collapse_and_reapplying_is_stable() {
        let mut fields = complete();
        fields.payee_name = primary(ExtractionOutcome::not_found("same reason"));
        fields.payer_name = primary(ExtractionOutcome::not_found("same reason"));
        let verdict = aggregate(&fields, &SecondaryStatus::NotConfigured);
        assert_eq!(verdict.notes.len(), 1);

        let mut record = ChequeExtraction::default();
        verdict.apply_to(&mut record);
        verdict.apply_to(&mut record);
        assert_eq!(record.review_notes.len(), 1);
        assert!(record.needs_review);
    }
}
