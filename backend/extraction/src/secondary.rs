//! Coercion of a secondary-source candidate into per-field outcomes.
//!
//! The candidate is untrusted: every value is re-validated with the same
//! rules the pattern extractors apply before it may take part in a merge.

use std::str::FromStr;

use chequeforge_core::{CandidateField, ExtractionOutcome, MicrBlock, StructuredCandidate};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// Field-extraction instruction sent with every secondary request.
pub const CANDIDATE_INSTRUCTION: &str = r#"You read Malaysian bank cheques. Extract the fields below from the cheque and reply with a single JSON object and nothing else.

Keys:
- payeeName: the name after PAY / BAYAR
- payerName: the account holder or company name printed near the signature
- amount: amount in figures, digits only, e.g. "1250.00"
- amountInWords: amount written in words, without RINGGIT MALAYSIA and ONLY / SAHAJA
- chequeDate: the cheque date as DD-MM-YYYY
- bankBranchCodeCenter: the clearing code printed as NN-NNNNN
- micr: object with raw, chequeNo, bankCode, branchCode, payerAccountNo, tranCode

Every field is an object {"value": string, "confidence": 0-100, "rationale": string}.
Use "unknown" as the value when a field is not legible. Do not guess."#;

static CENTER_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}-\d{5}$").unwrap());

/// Four-digit years first; `%Y` also accepts "24", so those years are
/// rejected below and the two-digit forms pick them up.
const DATE_FORMATS: [&str; 7] = [
    "%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y", "%d-%m-%y", "%d/%m/%y", "%d.%m.%y",
];

const MIN_YEAR: i32 = 1900;

/// Confidence ceiling for a MICR block missing any of its parts.
const PARTIAL_MICR_CONFIDENCE: u8 = 60;

/// Secondary-source outcomes, one per field, mirroring the primary pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryOutcomes {
    pub payee_name: ExtractionOutcome<String>,
    pub payer_name: ExtractionOutcome<String>,
    pub amount: ExtractionOutcome<Decimal>,
    pub amount_in_words: ExtractionOutcome<String>,
    pub cheque_date: ExtractionOutcome<NaiveDate>,
    pub bank_branch_code_center: ExtractionOutcome<String>,
    pub micr: ExtractionOutcome<MicrBlock>,
}

impl SecondaryOutcomes {
    pub fn from_candidate(candidate: &StructuredCandidate) -> Self {
        Self {
            payee_name: text(&candidate.payee_name),
            payer_name: text(&candidate.payer_name),
            amount: coerce(&candidate.amount, parse_amount),
            amount_in_words: coerce(&candidate.amount_in_words, |v| Some(v.to_uppercase())),
            cheque_date: coerce(&candidate.cheque_date, parse_date),
            bank_branch_code_center: coerce(&candidate.bank_branch_code_center, |v| {
                CENTER_CODE.is_match(v).then(|| v.to_string())
            }),
            micr: micr(candidate),
        }
    }

    /// An outcome set for a source that produced nothing.
    pub fn absent(reason: &str) -> Self {
        Self {
            payee_name: ExtractionOutcome::not_found(reason),
            payer_name: ExtractionOutcome::not_found(reason),
            amount: ExtractionOutcome::not_found(reason),
            amount_in_words: ExtractionOutcome::not_found(reason),
            cheque_date: ExtractionOutcome::not_found(reason),
            bank_branch_code_center: ExtractionOutcome::not_found(reason),
            micr: ExtractionOutcome::not_found(reason),
        }
    }
}

fn text(field: &CandidateField) -> ExtractionOutcome<String> {
    coerce(field, |v| Some(v.split_whitespace().collect::<Vec<_>>().join(" ")))
}

/// Validate a candidate value; placeholders and failed parses are `NotFound`.
fn coerce<T>(field: &CandidateField, parse: impl FnOnce(&str) -> Option<T>) -> ExtractionOutcome<T> {
    let Some(raw) = field.usable_value() else {
        return ExtractionOutcome::not_found("secondary source has no value");
    };
    match parse(raw) {
        Some(value) => ExtractionOutcome::Found {
            value,
            confidence: field.confidence,
            rationale: field.rationale.clone(),
        },
        None => ExtractionOutcome::not_found(format!("secondary value '{raw}' is not valid")),
    }
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c.is_whitespace())
        .chars()
        .filter(|c| *c != ',')
        .collect();
    Decimal::from_str(cleaned.trim())
        .ok()
        .filter(|d| d.is_sign_positive() && !d.is_zero())
        .map(|d| d.round_dp(2))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .filter_map(|f| NaiveDate::parse_from_str(raw.trim(), f).ok())
        .find(|d| d.year() >= MIN_YEAR)
}

fn micr(candidate: &StructuredCandidate) -> ExtractionOutcome<MicrBlock> {
    let m = &candidate.micr;
    let value = |f: &CandidateField| f.usable_value().map(str::to_string);
    let mut block = MicrBlock {
        raw: value(&m.raw),
        cheque_no: value(&m.cheque_no),
        bank_code: value(&m.bank_code),
        branch_code: value(&m.branch_code),
        payer_account_no: value(&m.payer_account_no),
        tran_code: value(&m.tran_code),
    };
    if block.cheque_no.is_none() && block.payer_account_no.is_none() {
        return ExtractionOutcome::not_found("secondary source has no MICR cheque or account number");
    }

    let missing: Vec<&str> = [
        (block.raw.is_none(), "raw line"),
        (block.cheque_no.is_none(), "cheque number"),
        (block.bank_code.is_none() || block.branch_code.is_none(), "bank/branch code"),
        (block.payer_account_no.is_none(), "account number"),
        (block.tran_code.is_none(), "transaction code"),
    ]
    .into_iter()
    .filter_map(|(absent, name)| absent.then_some(name))
    .collect();

    if block.raw.is_none() {
        block.raw = Some(assembled_line(&block));
    }
    let confidence = [&m.cheque_no, &m.payer_account_no]
        .iter()
        .filter_map(|f| f.confidence)
        .min();

    if missing.is_empty() {
        return ExtractionOutcome::Found {
            value: block,
            confidence,
            rationale: m.payer_account_no.rationale.clone(),
        };
    }
    let confidence = confidence.map_or(PARTIAL_MICR_CONFIDENCE, |c| c.min(PARTIAL_MICR_CONFIDENCE));
    ExtractionOutcome::graded(
        block,
        confidence,
        format!("secondary MICR block has no {}", missing.join(" or ")),
    )
}

/// A MICR line rebuilt from its parts, in printed order.
fn assembled_line(block: &MicrBlock) -> String {
    let bank_branch = match (&block.bank_code, &block.branch_code) {
        (Some(bank), Some(branch)) => Some(format!("{bank}{branch}")),
        (bank, branch) => bank.clone().or_else(|| branch.clone()),
    };
    [
        block.cheque_no.clone(),
        bank_branch,
        block.payer_account_no.clone(),
        block.tran_code.clone(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}
