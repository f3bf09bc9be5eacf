//! Per-field reconciliation of the primary and secondary passes.
//!
//! The primary result stands when it is `Found`. A secondary value fills
//! the gap only when the primary is `NotFound`, unless the field is listed
//! in [`MergePolicy::prefer_secondary`]. The score of a secondary value
//! that lost is kept for the aggregator.

use std::collections::HashSet;

use chequeforge_core::{ChequeExtraction, ChequeField, ExtractionOutcome, FieldSource, MicrBlock, ReviewNotes};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::extractors::PrimaryOutcomes;
use crate::secondary::SecondaryOutcomes;

/// Which fields, if any, trust the secondary pass over the primary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePolicy {
    pub prefer_secondary: HashSet<ChequeField>,
}

impl MergePolicy {
    pub fn preferring(fields: impl IntoIterator<Item = ChequeField>) -> Self {
        Self {
            prefer_secondary: fields.into_iter().collect(),
        }
    }

    /// Merge one field.
    pub fn pick<T>(
        &self,
        field: ChequeField,
        primary: ExtractionOutcome<T>,
        secondary: Option<ExtractionOutcome<T>>,
    ) -> Merged<T> {
        let secondary = secondary.filter(ExtractionOutcome::is_found);
        match (primary, secondary) {
            (primary, Some(secondary))
                if !primary.is_found() || self.prefer_secondary.contains(&field) =>
            {
                Merged {
                    outcome: secondary,
                    source: FieldSource::Secondary,
                    overruled: None,
                }
            }
            (primary, secondary) => Merged {
                outcome: primary,
                source: FieldSource::Primary,
                overruled: secondary.as_ref().and_then(SecondaryScore::of),
            },
        }
    }

    /// Merge every field. `secondary` is `None` when no secondary pass ran
    /// or it failed.
    pub fn merge(&self, primary: PrimaryOutcomes, secondary: Option<SecondaryOutcomes>) -> MergedFields {
        let (
            payee_name,
            payer_name,
            amount,
            amount_in_words,
            cheque_date,
            bank_branch_code_center,
            micr,
        ) = match secondary {
            Some(s) => (
                Some(s.payee_name),
                Some(s.payer_name),
                Some(s.amount),
                Some(s.amount_in_words),
                Some(s.cheque_date),
                Some(s.bank_branch_code_center),
                Some(s.micr),
            ),
            None => (None, None, None, None, None, None, None),
        };

        MergedFields {
            payee_name: self.pick(ChequeField::PayeeName, primary.payee_name, payee_name),
            payer_name: self.pick(ChequeField::PayerName, primary.payer_name, payer_name),
            amount: self.pick(ChequeField::Amount, primary.amount, amount),
            amount_in_words: self.pick(ChequeField::AmountInWords, primary.amount_in_words, amount_in_words),
            cheque_date: self.pick(ChequeField::ChequeDate, primary.cheque_date, cheque_date),
            bank_branch_code_center: self.pick(
                ChequeField::BankBranchCodeCenter,
                primary.bank_branch_code_center,
                bank_branch_code_center,
            ),
            micr: self.pick(ChequeField::Micr, primary.micr, micr),
        }
    }
}

/// A merged field outcome and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged<T> {
    pub outcome: ExtractionOutcome<T>,
    pub source: FieldSource,
    /// Score of a secondary value the primary outcome kept out.
    pub overruled: Option<SecondaryScore>,
}

impl<T> Merged<T> {
    pub fn primary(outcome: ExtractionOutcome<T>) -> Self {
        Self {
            outcome,
            source: FieldSource::Primary,
            overruled: None,
        }
    }
}

/// Confidence a secondary source reported for a value it found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryScore {
    pub confidence: u8,
    pub rationale: Option<String>,
}

impl SecondaryScore {
    fn of<T>(outcome: &ExtractionOutcome<T>) -> Option<Self> {
        Some(Self {
            confidence: outcome.confidence()?,
            rationale: outcome.rationale().map(str::to_string),
        })
    }
}

/// Borrowed view of one merged field, independent of its value type.
#[derive(Debug, Clone, Copy)]
pub struct FieldStatus<'a> {
    pub field: ChequeField,
    pub source: FieldSource,
    pub reason: Option<&'a str>,
    pub confidence: Option<u8>,
    pub rationale: Option<&'a str>,
    pub overruled: Option<&'a SecondaryScore>,
}

/// Final per-field outcomes after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedFields {
    pub payee_name: Merged<String>,
    pub payer_name: Merged<String>,
    pub amount: Merged<Decimal>,
    pub amount_in_words: Merged<String>,
    pub cheque_date: Merged<NaiveDate>,
    pub bank_branch_code_center: Merged<String>,
    pub micr: Merged<MicrBlock>,
}

fn status<T>(field: ChequeField, merged: &Merged<T>) -> FieldStatus<'_> {
    FieldStatus {
        field,
        source: merged.source,
        reason: merged.outcome.reason(),
        confidence: merged.outcome.confidence(),
        rationale: merged.outcome.rationale(),
        overruled: merged.overruled.as_ref(),
    }
}

impl MergedFields {
    /// Status of every field, in [`ChequeField::ALL`] order.
    pub fn statuses(&self) -> [FieldStatus<'_>; 7] {
        [
            status(ChequeField::PayeeName, &self.payee_name),
            status(ChequeField::PayerName, &self.payer_name),
            status(ChequeField::Amount, &self.amount),
            status(ChequeField::AmountInWords, &self.amount_in_words),
            status(ChequeField::ChequeDate, &self.cheque_date),
            status(ChequeField::BankBranchCodeCenter, &self.bank_branch_code_center),
            status(ChequeField::Micr, &self.micr),
        ]
    }

    /// Assemble the record. Review status is left for the aggregator.
    pub fn into_record(self, raw_text: String) -> ChequeExtraction {
        ChequeExtraction {
            payee_name: self.payee_name.outcome.into_value(),
            payer_name: self.payer_name.outcome.into_value(),
            amount: self.amount.outcome.into_value(),
            amount_in_words: self.amount_in_words.outcome.into_value(),
            cheque_date: self.cheque_date.outcome.into_value(),
            bank_branch_code_center: self.bank_branch_code_center.outcome.into_value(),
            micr: self.micr.outcome.into_value().unwrap_or_default(),
            raw_text,
            needs_review: false,
            review_notes: ReviewNotes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(v: &str) -> ExtractionOutcome<String> {
        ExtractionOutcome::found(v.to_string())
    }

    fn missing() -> ExtractionOutcome<String> {
        ExtractionOutcome::not_found("no anchor")
    }

    #[test]
    fn primary_found_always_wins_by_default() {
        let policy = MergePolicy::default();
        for secondary in [Some(found("Other")), Some(missing()), None] {
            let merged = policy.pick(ChequeField::PayeeName, found("John Doe"), secondary);
            assert_eq!(merged.outcome.value().map(String::as_str), Some("John Doe"));
            assert_eq!(merged.source, FieldSource::Primary);
        }
    }

    #[test]
    fn secondary_fills_a_primary_gap() {
        let merged = MergePolicy::default().pick(ChequeField::PayeeName, missing(), Some(found("Jane")));
        assert_eq!(merged.outcome.value().map(String::as_str), Some("Jane"));
        assert_eq!(merged.source, FieldSource::Secondary);
    }

    #[test]
    fn both_missing_keeps_primary_reason() {
        let secondary = ExtractionOutcome::not_found("secondary source has no value");
        let merged = MergePolicy::default().pick(ChequeField::PayeeName, missing(), Some(secondary));
        assert_eq!(merged.outcome.reason(), Some("no anchor"));
        assert_eq!(merged.source, FieldSource::Primary);
    }

    #[test]
    fn losing_secondary_score_is_kept() {
        let secondary = ExtractionOutcome::graded("Jane Roe".to_string(), 20, "faint print");
        let merged = MergePolicy::default().pick(ChequeField::PayeeName, found("John Doe"), Some(secondary));
        assert_eq!(merged.source, FieldSource::Primary);
        let score = merged.overruled.unwrap();
        assert_eq!(score.confidence, 20);
        assert_eq!(score.rationale.as_deref(), Some("faint print"));

        let merged = MergePolicy::default().pick(ChequeField::PayeeName, found("John Doe"), Some(found("Jane")));
        assert!(merged.overruled.is_none());

        let secondary = ExtractionOutcome::graded("Jane Roe".to_string(), 20, "faint print");
        let merged = MergePolicy::default().pick(ChequeField::PayeeName, missing(), Some(secondary));
        assert_eq!(merged.source, FieldSource::Secondary);
        assert!(merged.overruled.is_none());
    }

    #[test]
    fn preferred_field_takes_secondary_when_it_has_a_value() {
        let policy = MergePolicy::preferring([ChequeField::PayerName]);
        let merged = policy.pick(ChequeField::PayerName, found("LIM ENT"), Some(found("Lim Enterprise Sdn Bhd")));
        assert_eq!(merged.source, FieldSource::Secondary);

        let merged = policy.pick(ChequeField::PayerName, found("LIM ENT"), Some(missing()));
        assert_eq!(merged.outcome.value().map(String::as_str), Some("LIM ENT"));

        let merged = policy.pick(ChequeField::PayeeName, found("John"), Some(found("Jon")));
        assert_eq!(merged.source, FieldSource::Primary);
    }

    #[test]
    fn record_uses_sentinels_for_unresolved_fields() {
        let primary = PrimaryOutcomes {
            payee_name: found("John Doe"),
            payer_name: missing(),
            amount: ExtractionOutcome::not_found("no RM anchor"),
            amount_in_words: missing(),
            cheque_date: ExtractionOutcome::not_found("no DATE anchor"),
            bank_branch_code_center: missing(),
            micr: ExtractionOutcome::not_found("MICR line unparsable."),
        };
        let record = MergePolicy::default().merge(primary, None).into_record("PAY John Doe".into());
        assert_eq!(record.payee_name.as_deref(), Some("John Doe"));
        assert!(record.is_unknown(ChequeField::Amount));
        assert!(record.is_unknown(ChequeField::Micr));
        assert_eq!(record.raw_text, "PAY John Doe");
    }
}
