//! The contract a secondary (model-based) extraction pass must satisfy.
//!
//! Whatever shape the model actually replies with is coerced into these types
//! at the boundary; the merge policy only ever sees this structure.

use serde::{Deserialize, Serialize};

use crate::sentinel::is_placeholder;
use crate::types::ChequeField;

/// One field as guessed by the secondary source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// 0–100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl CandidateField {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence.min(100));
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// The value, unless it is missing or a placeholder.
    pub fn usable_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !is_placeholder(v))
    }
}

/// Secondary-source guess at the MICR block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrCandidate {
    #[serde(default)]
    pub raw: CandidateField,
    #[serde(default)]
    pub cheque_no: CandidateField,
    #[serde(default)]
    pub bank_code: CandidateField,
    #[serde(default)]
    pub branch_code: CandidateField,
    #[serde(default)]
    pub payer_account_no: CandidateField,
    #[serde(default)]
    pub tran_code: CandidateField,
}

/// Best-effort structured guess for every field of a cheque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredCandidate {
    #[serde(default)]
    pub payee_name: CandidateField,
    #[serde(default)]
    pub payer_name: CandidateField,
    #[serde(default)]
    pub amount: CandidateField,
    #[serde(default)]
    pub amount_in_words: CandidateField,
    #[serde(default)]
    pub cheque_date: CandidateField,
    #[serde(default)]
    pub bank_branch_code_center: CandidateField,
    #[serde(default)]
    pub micr: MicrCandidate,
}

impl StructuredCandidate {
    /// The scalar candidate for a field; `None` for the MICR block.
    pub fn field(&self, field: ChequeField) -> Option<&CandidateField> {
        match field {
            ChequeField::PayeeName => Some(&self.payee_name),
            ChequeField::PayerName => Some(&self.payer_name),
            ChequeField::Amount => Some(&self.amount),
            ChequeField::AmountInWords => Some(&self.amount_in_words),
            ChequeField::ChequeDate => Some(&self.cheque_date),
            ChequeField::BankBranchCodeCenter => Some(&self.bank_branch_code_center),
            ChequeField::Micr => None,
        }
    }

    pub fn field_mut(&mut self, field: ChequeField) -> Option<&mut CandidateField> {
        match field {
            ChequeField::PayeeName => Some(&mut self.payee_name),
            ChequeField::PayerName => Some(&mut self.payer_name),
            ChequeField::Amount => Some(&mut self.amount),
            ChequeField::AmountInWords => Some(&mut self.amount_in_words),
            ChequeField::ChequeDate => Some(&mut self.cheque_date),
            ChequeField::BankBranchCodeCenter => Some(&mut self.bank_branch_code_center),
            ChequeField::Micr => None,
        }
    }

    /// Whether the candidate carries no usable value at all.
    pub fn is_empty(&self) -> bool {
        let scalars_empty = ChequeField::ALL
            .into_iter()
            .filter_map(|f| self.field(f))
            .all(|c| c.usable_value().is_none());
        let micr_empty = [&self.micr.cheque_no, &self.micr.payer_account_no]
            .iter()
            .all(|c| c.usable_value().is_none());
        scalars_empty && micr_empty
    }
}
