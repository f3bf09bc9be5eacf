use std::str::FromStr;

use chequeforge_core::ExtractionOutcome;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::anchor::{find_anchor, following_lines};
use crate::normalizer::ChequeText;

static RM_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bRM").unwrap());

/// Surface forms tried in order after the anchor. The first match wins.
static AMOUNT_FORMS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        Regex::new(r"^[\s:.*#=]*(\d{1,3}(?:,\d{3})+\.\d{2})\b").unwrap(),
        Regex::new(r"^[\s:.*#=]*(\d+\.\d{2})\b").unwrap(),
        Regex::new(r"^[\s:.*#=]*([\d,]+(?:\.\d+)?)").unwrap(),
        Regex::new(r"^[\s:.*#=]*(\S+)").unwrap(),
    ]
});

/// Amount in figures: the number following the RM label.
pub fn extract_amount(text: &ChequeText) -> ExtractionOutcome<Decimal> {
    let lines = text.lines();
    let Some(hit) = find_anchor(lines, &RM_ANCHOR) else {
        return ExtractionOutcome::not_found("Could not parse amount in figures: no RM anchor found.");
    };

    let window = if hit.rest.trim().is_empty() {
        following_lines(lines, &hit, 1).first().copied().unwrap_or("")
    } else {
        hit.rest
    };

    let Some(raw) = AMOUNT_FORMS
        .iter()
        .find_map(|re| re.captures(window))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        return ExtractionOutcome::not_found(
            "Could not parse amount in figures: nothing after the RM anchor.",
        );
    };

    validate(raw)
}

fn validate(raw: &str) -> ExtractionOutcome<Decimal> {
    let Ok(amount) = Decimal::from_str(&raw.replace(',', "")) else {
        return ExtractionOutcome::not_found(format!(
            "Could not parse amount in figures: '{raw}' after RM is not a valid amount."
        ));
    };
    if amount.is_zero() {
        ExtractionOutcome::not_found(format!(
            "Could not parse amount in figures: '{raw}' is zero."
        ))
    } else if amount.is_sign_negative() {
        ExtractionOutcome::not_found(format!(
            "Could not parse amount in figures: '{raw}' is negative."
        ))
    } else {
        ExtractionOutcome::found(amount.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> ExtractionOutcome<Decimal> {
        extract_amount(&ChequeText::new(text))
    }

    #[test]
    fn grouped_thousands() {
        assert_eq!(amount("RM 1,250.00").into_value(), Some(Decimal::new(125000, 2)));
    }

    #[test]
    fn decorated_and_on_next_line() {
        assert_eq!(amount("RM **350.50**").into_value(), Some(Decimal::new(35050, 2)));
        assert_eq!(amount("RM\n 99.90").into_value(), Some(Decimal::new(9990, 2)));
    }

    #[test]
    fn non_numeric_is_not_a_false_match() {
        let outcome = amount("RM abc.de");
        assert!(!outcome.is_found());
        assert!(outcome.reason().unwrap().contains("'abc.de'"));
    }

    #[test]
    fn zero_is_not_found() {
        assert!(amount("RM 0.00").reason().unwrap().contains("zero"));
    }

    #[test]
    fn missing_anchor() {
        let outcome = amount("PAY John\n1,250.00");
        assert!(outcome.reason().unwrap().contains("no RM anchor"));
    }

    #[test]
    fn first_form_wins() {
        // The grouped form matches before the bare digit run.
        assert_eq!(amount("RM 12,000.00 12").into_value(), Some(Decimal::new(1200000, 2)));
    }
}
