//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens and account-number-length digit runs from
//! strings prior to logging.

use std::sync::LazyLock;

use regex::Regex;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9\-_]{16,})|(AIza[0-9A-Za-z\-_]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static KEY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([?&](?:key|token)=)[^&\s]+").unwrap());
/// Payer account numbers and MICR lines.
static ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{8,}").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = KEY_PARAM_RE.replace_all(&redacted, "${1}[REDACTED_TOKEN]");
    ACCOUNT_RE
        .replace_all(&redacted, |caps: &regex::Captures| {
            let digits = &caps[0];
            format!("****{}", &digits[digits.len() - 4..])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "POST with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9 for account 0123456789";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.contains("****6789"));
        assert!(!clean.contains("0123456789"));
    }

    #[test]
    fn masks_query_keys_and_leaves_short_numbers() {
        let clean = redact_sensitive_data("GET /v1/images:annotate?key=AIzaSecret cheque 123456 RM 500.00");
        assert!(clean.contains("key=[REDACTED_TOKEN]"));
        assert!(clean.contains("123456"));
        assert!(clean.contains("500.00"));
    }
}
