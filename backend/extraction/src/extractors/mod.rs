//! One pure function per field, each `(&ChequeText) -> ExtractionOutcome`.
//!
//! Extractors share nothing but the normalized text; none reads another's
//! result.

mod amount;
mod amount_words;
mod center_code;
mod date;
mod payee;
mod payer;

pub use amount::extract_amount;
pub use amount_words::extract_amount_in_words;
pub use center_code::extract_center_code;
pub use date::extract_date;
pub use payee::extract_payee;
pub use payer::extract_payer;

use chequeforge_core::{ExtractionOutcome, MicrBlock};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::micr::decode_micr;
use crate::normalizer::ChequeText;

/// Primary-pass outcomes for every field of a cheque.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryOutcomes {
    pub payee_name: ExtractionOutcome<String>,
    pub payer_name: ExtractionOutcome<String>,
    pub amount: ExtractionOutcome<Decimal>,
    pub amount_in_words: ExtractionOutcome<String>,
    pub cheque_date: ExtractionOutcome<NaiveDate>,
    pub bank_branch_code_center: ExtractionOutcome<String>,
    pub micr: ExtractionOutcome<MicrBlock>,
}

/// Run every pattern-based extractor over the same text.
pub fn extract_primary(text: &ChequeText) -> PrimaryOutcomes {
    PrimaryOutcomes {
        payee_name: extract_payee(text),
        payer_name: extract_payer(text),
        amount: extract_amount(text),
        amount_in_words: extract_amount_in_words(text),
        cheque_date: extract_date(text),
        bank_branch_code_center: extract_center_code(text),
        micr: decode_micr(text),
    }
}
