use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ChequeError;
use crate::review::ReviewNotes;
use crate::sentinel;

/// The unified output record of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChequeExtraction {
    #[serde(with = "sentinel::text", default)]
    pub payee_name: Option<String>,
    #[serde(with = "sentinel::text", default)]
    pub payer_name: Option<String>,
    /// Amount in figures.
    #[serde(with = "sentinel::amount", default)]
    pub amount: Option<Decimal>,
    #[serde(with = "sentinel::text", default)]
    pub amount_in_words: Option<String>,
    #[serde(with = "sentinel::date", default)]
    pub cheque_date: Option<NaiveDate>,
    /// Clearing center code, `NN-NNNNN`.
    #[serde(with = "sentinel::text", default)]
    pub bank_branch_code_center: Option<String>,
    #[serde(default)]
    pub micr: MicrBlock,
    /// Normalized OCR text, kept verbatim for audit.
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default)]
    pub review_notes: ReviewNotes,
}

impl ChequeExtraction {
    /// Whether a field is at its sentinel value.
    pub fn is_unknown(&self, field: ChequeField) -> bool {
        match field {
            ChequeField::PayeeName => self.payee_name.is_none(),
            ChequeField::PayerName => self.payer_name.is_none(),
            ChequeField::Amount => self.amount.is_none(),
            ChequeField::AmountInWords => self.amount_in_words.is_none(),
            ChequeField::ChequeDate => self.cheque_date.is_none(),
            ChequeField::BankBranchCodeCenter => self.bank_branch_code_center.is_none(),
            ChequeField::Micr => self.micr.raw.is_none(),
        }
    }
}

/// The decoded magnetic-ink line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrBlock {
    #[serde(with = "sentinel::text", default)]
    pub raw: Option<String>,
    #[serde(with = "sentinel::text", default)]
    pub cheque_no: Option<String>,
    #[serde(with = "sentinel::text", default)]
    pub bank_code: Option<String>,
    #[serde(with = "sentinel::text", default)]
    pub branch_code: Option<String>,
    #[serde(with = "sentinel::text", default)]
    pub payer_account_no: Option<String>,
    #[serde(with = "sentinel::text", default)]
    pub tran_code: Option<String>,
}

/// Fields of a [`ChequeExtraction`] that extraction strategies resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChequeField {
    PayeeName,
    PayerName,
    Amount,
    AmountInWords,
    ChequeDate,
    BankBranchCodeCenter,
    Micr,
}

impl ChequeField {
    pub const ALL: [ChequeField; 7] = [
        ChequeField::PayeeName,
        ChequeField::PayerName,
        ChequeField::Amount,
        ChequeField::AmountInWords,
        ChequeField::ChequeDate,
        ChequeField::BankBranchCodeCenter,
        ChequeField::Micr,
    ];

    /// Wire name (camelCase), as used in records and config.
    pub fn key(self) -> &'static str {
        match self {
            ChequeField::PayeeName => "payeeName",
            ChequeField::PayerName => "payerName",
            ChequeField::Amount => "amount",
            ChequeField::AmountInWords => "amountInWords",
            ChequeField::ChequeDate => "chequeDate",
            ChequeField::BankBranchCodeCenter => "bankBranchCodeCenter",
            ChequeField::Micr => "micr",
        }
    }

    /// Human-readable label for review notes.
    pub fn label(self) -> &'static str {
        match self {
            ChequeField::PayeeName => "payee name",
            ChequeField::PayerName => "payer name",
            ChequeField::Amount => "amount in figures",
            ChequeField::AmountInWords => "amount in words",
            ChequeField::ChequeDate => "cheque date",
            ChequeField::BankBranchCodeCenter => "bank branch center code",
            ChequeField::Micr => "MICR line",
        }
    }

    /// A mandatory field at its sentinel value forces human review.
    pub fn is_mandatory(self) -> bool {
        !matches!(self, ChequeField::BankBranchCodeCenter)
    }
}

impl fmt::Display for ChequeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ChequeField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChequeField::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown cheque field '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Image reference
// ---------------------------------------------------------------------------

/// A submitted cheque image.
#[derive(Debug, Clone)]
pub struct ChequeImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl ChequeImage {
    /// Wrap uploaded bytes, rejecting anything that is not an image.
    pub fn from_bytes(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Result<Self, ChequeError> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(ChequeError::InvalidImage(format!(
                "Not an image! Please upload an image file (got {mime_type})."
            )));
        }
        if bytes.is_empty() {
            return Err(ChequeError::InvalidImage("image is empty".into()));
        }
        Ok(Self {
            bytes,
            mime_type,
            file_name: file_name.into(),
        })
    }

    /// Read an image from disk, typing it by extension.
    pub async fn from_path(path: &Path) -> Result<Self, ChequeError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ChequeError::InvalidImage(format!("cannot read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("cheque")
            .to_string();
        Self::from_bytes(bytes, image_mime_type(path), file_name)
    }
}

/// MIME type of an image file by extension.
pub fn image_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "heic"         => "image/heic",
        _              => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_record_is_all_sentinels() {
        let json = serde_json::to_value(ChequeExtraction::default()).unwrap();
        assert_eq!(json["payeeName"], "unknown");
        assert_eq!(json["amount"], 0);
        assert_eq!(json["chequeDate"], "unknown");
        assert_eq!(json["micr"]["payerAccountNo"], "unknown");
        assert_eq!(json["reviewNotes"], serde_json::json!([]));
    }

    #[test]
    fn field_keys_round_trip_through_from_str() {
        for field in ChequeField::ALL {
            assert_eq!(field.key().parse::<ChequeField>().unwrap(), field);
        }
        assert!("signature".parse::<ChequeField>().is_err());
    }

    #[test]
    fn center_code_is_the_only_optional_field() {
        let optional: Vec<_> = ChequeField::ALL.into_iter().filter(|f| !f.is_mandatory()).collect();
        assert_eq!(optional, vec![ChequeField::BankBranchCodeCenter]);
    }

    #[test]
    fn rejects_non_images() {
        let err = ChequeImage::from_bytes(vec![1, 2, 3], "application/pdf", "x.pdf").unwrap_err();
        assert!(matches!(err, ChequeError::InvalidImage(_)));
        assert_eq!(image_mime_type(&PathBuf::from("scan.JPG")), "image/jpeg");
    }
}
