use chequeforge_core::ExtractionOutcome;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::anchor::squash_whitespace;
use crate::normalizer::ChequeText;

static SIGNATURE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:SIGNATURE|TANDATANGAN)\b").unwrap());
static NON_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\s]").unwrap());

/// How far above the signature label the signer's name may sit.
const LOOKBACK_LINES: usize = 3;

/// Payer (signer) name: the nearest legible line above the signature label.
pub fn extract_payer(text: &ChequeText) -> ExtractionOutcome<String> {
    let lines = text.lines();
    let Some(label_index) = lines.iter().position(|l| SIGNATURE_LABEL.is_match(l)) else {
        return ExtractionOutcome::not_found(
            "Could not parse payer name: no SIGNATURE/TANDATANGAN label found.",
        );
    };

    let candidate = lines[..label_index]
        .iter()
        .rev()
        .take(LOOKBACK_LINES)
        .map(|l| squash_whitespace(&NON_ALPHA.replace_all(l, "")))
        .find(|l| !l.is_empty());

    match candidate {
        Some(name) if name.chars().count() >= 3 => ExtractionOutcome::found(name),
        Some(name) => ExtractionOutcome::not_found(format!(
            "Could not parse payer name: '{name}' above the signature label is too short."
        )),
        None => ExtractionOutcome::not_found(
            "Could not parse payer name: nothing legible above the signature label.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payer(text: &str) -> ExtractionOutcome<String> {
        extract_payer(&ChequeText::new(text))
    }

    #[test]
    fn line_above_signature_stripped_of_noise() {
        let outcome = payer("RM 10.00\nLIM ENTERPRISE SDN. BHD. |\nAUTHORISED SIGNATURE");
        assert_eq!(outcome.value().map(String::as_str), Some("LIM ENTERPRISE SDN BHD"));
    }

    #[test]
    fn skips_blank_and_numeric_lines() {
        let outcome = payer("Siti Aminah\n\n0123\nTANDATANGAN");
        assert_eq!(outcome.value().map(String::as_str), Some("Siti Aminah"));
    }

    #[test]
    fn short_candidate_is_rejected() {
        let outcome = payer("RM 5.00\nJo.\nSIGNATURE");
        assert!(outcome.reason().unwrap().contains("too short"));
    }

    #[test]
    fn label_missing() {
        assert!(payer("PAY John").reason().unwrap().contains("no SIGNATURE/TANDATANGAN"));
    }

    #[test]
    fn label_on_first_line() {
        assert!(payer("SIGNATURE\nJohn").reason().unwrap().contains("nothing legible"));
    }
}
