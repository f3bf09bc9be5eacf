use chequeforge_core::ExtractionOutcome;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::anchor::{find_anchor, following_lines, squash_whitespace};
use crate::normalizer::ChequeText;

static PAY_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:PAY|BAYAR)\b").unwrap());
static LEADING_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s/:.\-]+").unwrap());
static BEARER_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\b(?:OR|ATAU)\s+(?:BEARER|PEMBAWA|ORDER|PESANAN)\b.*$").unwrap()
});

/// Payee name: text after the PAY/BAYAR label, or the line below it.
pub fn extract_payee(text: &ChequeText) -> ExtractionOutcome<String> {
    let lines = text.lines();
    let Some(hit) = find_anchor(lines, &PAY_ANCHOR) else {
        return ExtractionOutcome::not_found("Could not parse payee name: no PAY/BAYAR anchor found.");
    };

    if let Some(name) = clean(hit.rest) {
        return ExtractionOutcome::found(name);
    }
    match following_lines(lines, &hit, 1).first().and_then(|l| clean(l)) {
        Some(name) => ExtractionOutcome::found(name),
        None => ExtractionOutcome::not_found(
            "Could not parse payee name: nothing legible after the PAY/BAYAR anchor.",
        ),
    }
}

fn clean(fragment: &str) -> Option<String> {
    let stripped = LEADING_NOISE.replace(fragment, "");
    let stripped = BEARER_SUFFIX.replace(&stripped, "");
    let name = squash_whitespace(&stripped);
    let letters = name.chars().filter(|c| c.is_alphabetic()).count();
    (letters >= 2).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_on_anchor_line() {
        let outcome = extract_payee(&ChequeText::new("PAY John Doe\nRM 1,250.00"));
        assert_eq!(outcome.value().map(String::as_str), Some("John Doe"));
    }

    #[test]
    fn bilingual_label_and_bearer_suffix() {
        let outcome = extract_payee(&ChequeText::new("BAYAR / PAY : Tan Mei Ling  ATAU PEMBAWA / OR BEARER"));
        assert_eq!(outcome.value().map(String::as_str), Some("Tan Mei Ling"));
    }

    #[test]
    fn name_on_next_line() {
        let outcome = extract_payee(&ChequeText::new("PAY\n\n  Ahmad bin Ali\nRM 50.00"));
        assert_eq!(outcome.value().map(String::as_str), Some("Ahmad bin Ali"));
    }

    #[test]
    fn payee_label_is_not_an_anchor() {
        let outcome = extract_payee(&ChequeText::new("PAYEE Jane\nRM 10.00"));
        assert!(outcome.reason().unwrap().contains("no PAY/BAYAR anchor"));
    }

    #[test]
    fn illegible_remainder_is_not_found() {
        let outcome = extract_payee(&ChequeText::new("PAY ---\n12345"));
        assert!(outcome.reason().unwrap().contains("nothing legible"));
    }
}
