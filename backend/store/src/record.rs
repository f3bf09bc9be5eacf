use std::fmt;
use std::str::FromStr;

use chequeforge_core::sentinel;
use chequeforge_core::{ChequeExtraction, ChequeField, MicrBlock};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a record sits in the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Processed,
    Reviewed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Processed => write!(f, "processed"),
            RecordStatus::Reviewed => write!(f, "reviewed"),
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processed" => Ok(RecordStatus::Processed),
            "reviewed" => Ok(RecordStatus::Reviewed),
            other => Err(format!("unknown record status '{other}'")),
        }
    }
}

/// A persisted extraction. The extraction fields are flattened so the JSON
/// shape is the extraction record plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChequeRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub extraction: ChequeExtraction,
    /// Public path of the stored image, e.g. `/uploads/1718000000000-cheque.jpg`.
    pub image_url: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChequeRecord {
    pub fn new(extraction: ChequeExtraction, image_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            extraction,
            image_url: image_url.into(),
            status: RecordStatus::Processed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn needs_review(&self) -> bool {
        self.extraction.needs_review
    }
}

/// Reviewer corrections. Absent (or placeholder) fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    #[serde(default, deserialize_with = "sentinel::text::deserialize")]
    pub payee_name: Option<String>,
    #[serde(default, deserialize_with = "sentinel::text::deserialize")]
    pub payer_name: Option<String>,
    #[serde(default, deserialize_with = "sentinel::amount::deserialize")]
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "sentinel::text::deserialize")]
    pub amount_in_words: Option<String>,
    #[serde(default, deserialize_with = "sentinel::date::deserialize")]
    pub cheque_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "sentinel::text::deserialize")]
    pub bank_branch_code_center: Option<String>,
    #[serde(default)]
    pub micr: Option<MicrBlock>,
}

impl ReviewPatch {
    /// Fields this patch sets.
    pub fn fields(&self) -> Vec<ChequeField> {
        let mut fields = Vec::new();
        let mut mark = |set: bool, field| {
            if set {
                fields.push(field);
            }
        };
        mark(self.payee_name.is_some(), ChequeField::PayeeName);
        mark(self.payer_name.is_some(), ChequeField::PayerName);
        mark(self.amount.is_some(), ChequeField::Amount);
        mark(self.amount_in_words.is_some(), ChequeField::AmountInWords);
        mark(self.cheque_date.is_some(), ChequeField::ChequeDate);
        mark(self.bank_branch_code_center.is_some(), ChequeField::BankBranchCodeCenter);
        mark(self.micr.is_some(), ChequeField::Micr);
        fields
    }

    /// Overwrite the patched fields and close the review.
    pub fn apply(self, record: &mut ChequeRecord) {
        let target = &mut record.extraction;
        if let Some(v) = self.payee_name {
            target.payee_name = Some(v);
        }
        if let Some(v) = self.payer_name {
            target.payer_name = Some(v);
        }
        if let Some(v) = self.amount {
            target.amount = Some(v.round_dp(2));
        }
        if let Some(v) = self.amount_in_words {
            target.amount_in_words = Some(v);
        }
        if let Some(v) = self.cheque_date {
            target.cheque_date = Some(v);
        }
        if let Some(v) = self.bank_branch_code_center {
            target.bank_branch_code_center = Some(v);
        }
        if let Some(v) = self.micr {
            target.micr = v;
        }
        target.needs_review = false;
        target.review_notes.clear();
        record.status = RecordStatus::Reviewed;
        record.updated_at = Utc::now();
    }
}
