use chequeforge_core::ExtractionOutcome;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalizer::ChequeText;

static PAY_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:PAY|BAYAR)\b").unwrap());
static CENTER_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2})\s*[-–—]\s*(\d{5})\b").unwrap());

/// Header lines searched when the cheque has no PAY line.
const HEADER_LINES: usize = 6;

/// Clearing center code (`NN-NNNNN`), printed in the header above the PAY line.
pub fn extract_center_code(text: &ChequeText) -> ExtractionOutcome<String> {
    let lines = text.lines();
    let header_end = lines
        .iter()
        .position(|l| PAY_LINE.is_match(l))
        .unwrap_or(HEADER_LINES.min(lines.len()));

    lines[..header_end]
        .iter()
        .find_map(|l| CENTER_CODE.captures(l))
        .map(|c| ExtractionOutcome::found(format!("{}-{}", &c[1], &c[2])))
        .unwrap_or_else(|| {
            ExtractionOutcome::not_found(
                "Could not parse bank branch center code: no NN-NNNNN code in the cheque header.",
            )
        })
}
