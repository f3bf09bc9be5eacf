use chequeforge_core::ExtractionOutcome;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::anchor::{AnchorHit, find_anchor_first, window};
use crate::normalizer::ChequeText;

/// Malay label first, then English.
static WORDS_ANCHORS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)\bRINGGIT(?:\s+MALAYSIA)?\b").unwrap(),
        Regex::new(r"(?i)\b(?:THE\s+)?SUM\s+OF\b").unwrap(),
    ]
});

static LEADING_LABELS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:[\s:/.\-]|\bRINGGIT\b|\bMALAYSIA\b)*").unwrap());
static TERMINATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([A-Z][A-Z\s,\-]*?)\s*\b(?:ONLY|SAHAJA)\b").unwrap());
static LETTER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z\s\-]*)").unwrap());

const NUMBER_WORDS: &[&str] = &[
    // English
    "ZERO", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN",
    "ELEVEN", "TWELVE", "THIRTEEN", "FOURTEEN", "FIFTEEN", "SIXTEEN", "SEVENTEEN", "EIGHTEEN",
    "NINETEEN", "TWENTY", "THIRTY", "FORTY", "FIFTY", "SIXTY", "SEVENTY", "EIGHTY", "NINETY",
    "HUNDRED", "THOUSAND", "MILLION",
    // Malay
    "KOSONG", "SATU", "DUA", "TIGA", "EMPAT", "LIMA", "ENAM", "TUJUH", "LAPAN", "SEMBILAN",
    "SEPULUH", "SEBELAS", "BELAS", "PULUH", "RATUS", "RIBU", "JUTA", "SERATUS", "SERIBU",
    "SEJUTA",
];

const CONNECTOR_WORDS: &[&str] = &["AND", "DAN", "CENTS", "CENT", "SEN", "RINGGIT"];

/// Amount in words: the phrase after the RINGGIT MALAYSIA / THE SUM OF label,
/// normally closed by ONLY/SAHAJA.
pub fn extract_amount_in_words(text: &ChequeText) -> ExtractionOutcome<String> {
    let lines = text.lines();
    let Some(hit) = WORDS_ANCHORS.iter().find_map(|re| find_anchor_first(lines, re)) else {
        return ExtractionOutcome::not_found(
            "Could not parse amount in words: no RINGGIT MALAYSIA / THE SUM OF anchor found.",
        );
    };

    match terminated_phrase(lines, &hit) {
        Some(phrase) => validate(&phrase, None),
        None => match unterminated_phrase(&hit) {
            Some(phrase) => validate(&phrase, Some("no ONLY/SAHAJA terminator")),
            None => ExtractionOutcome::not_found(
                "Could not parse amount in words: no words after the RINGGIT MALAYSIA / THE SUM OF anchor.",
            ),
        },
    }
}

fn strip_labels(s: &str) -> &str {
    LEADING_LABELS
        .find(s)
        .map_or(s, |m| &s[m.end()..])
}

fn terminated_phrase(lines: &[String], hit: &AnchorHit<'_>) -> Option<String> {
    let joined = window(lines, hit, 2, " ");
    TERMINATED
        .captures(strip_labels(&joined))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn unterminated_phrase(hit: &AnchorHit<'_>) -> Option<String> {
    LETTER_RUN
        .captures(strip_labels(hit.rest))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn validate(phrase: &str, doubt: Option<&str>) -> ExtractionOutcome<String> {
    let upper = phrase.to_uppercase().replace(',', " ");
    let words: Vec<&str> = upper.split_whitespace().collect();
    let value = words.join(" ");

    let mut number_words = 0;
    let mut unknown = Vec::new();
    for word in words.iter().flat_map(|w| w.split('-')).filter(|w| !w.is_empty()) {
        if NUMBER_WORDS.contains(&word) {
            number_words += 1;
        } else if !CONNECTOR_WORDS.contains(&word) {
            unknown.push(word);
        }
    }

    if number_words == 0 {
        return ExtractionOutcome::not_found(format!(
            "Could not parse amount in words: '{value}' contains no number words."
        ));
    }

    let mut doubts: Vec<String> = doubt.into_iter().map(str::to_string).collect();
    if !unknown.is_empty() {
        doubts.push(format!("unrecognised words {}", unknown.join(", ")));
    }
    if doubts.is_empty() {
        ExtractionOutcome::found(value)
    } else {
        ExtractionOutcome::graded(value, 70, doubts.join("; "))
    }
}
