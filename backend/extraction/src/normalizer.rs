//! Boilerplate removal ahead of field extraction.
//!
//! Cheques carry printed legal text ("do not sign below this line", stamp
//! duty notices) whose words collide with field anchors: "TANDATANGAN" is
//! the signature label, "ONLY"/"SAHAJA" terminate the amount in words. Those
//! phrases are cut out here and nothing else is touched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Printed phrases removed from recognized text, space-separated words.
///
/// Matching is case-insensitive and never crosses a line break.
const BOILERPLATE_PHRASES: &[&str] = &[
    r"please do not (?:write or )?sign below this line",
    r"do not (?:write|sign) (?:or (?:write|sign) )?below this line",
    r"sila jangan (?:tulis (?:atau|dan) )?tandatangan di bawah (?:garisan|ruang) ini",
    r"jangan tulis di bawah (?:garisan|ruang) ini",
    r"stamp duty (?:has been )?paid",
    r"duti setem (?:telah )?dibayar",
    r"(?:this cheque is )?valid for (?:six|6) months(?: only)?(?: from the date of issue)?",
    r"(?:cek ini )?sah (?:untuk|selama) (?:enam|6) bulan(?: sahaja)?(?: dari tarikh dikeluarkan)?",
    r"for bank use only",
    r"untuk kegunaan bank sahaja",
];

static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    BOILERPLATE_PHRASES
        .iter()
        .map(|p| Regex::new(&format!(r"(?i)\b{}\b", p.replace(' ', r"[ \t]+"))).unwrap())
        .collect()
});

/// Strip known boilerplate phrases from raw recognized text.
///
/// Idempotent: removal repeats until no phrase matches, so a phrase exposed
/// by an earlier cut is removed in the same call.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let mut changed = false;
        for re in BOILERPLATE.iter() {
            if re.is_match(&text) {
                text = re.replace_all(&text, "").into_owned();
                changed = true;
            }
        }
        if !changed {
            return text;
        }
    }
}

/// Normalized cheque text plus its line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChequeText {
    text: String,
    lines: Vec<String>,
}

impl ChequeText {
    /// Normalize raw OCR output.
    pub fn new(raw: &str) -> Self {
        Self::from_normalized(normalize(raw))
    }

    /// Wrap text that has already been normalized.
    pub fn from_normalized(text: String) -> Self {
        let lines = text.lines().map(str::to_string).collect();
        Self { text, lines }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_bilingual_disclaimers() {
        let raw = "AUTHORISED SIGNATURE\nSILA JANGAN TULIS ATAU TANDATANGAN DI BAWAH RUANG INI\nPlease do not write or sign below this line";
        let out = normalize(raw);
        assert!(!out.to_uppercase().contains("TANDATANGAN"));
        assert!(!out.to_lowercase().contains("below this line"));
        assert!(out.contains("AUTHORISED SIGNATURE"));
        assert_eq!(out.split('\n').count(), 3);
    }

    #[test]
    fn leaves_clean_text_alone() {
        let raw = "PAY John Doe\nRM 1,250.00\nDate: 15/06/2024";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "Valid for six months only\nRINGGIT MALAYSIA ONE HUNDRED ONLY",
            "STAMP DUTY STAMP DUTY PAID PAID",
            "duti setem dibayar / stamp duty paid\nFOR BANK USE ONLY",
            "",
        ];
        for raw in inputs {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn nested_phrase_is_removed_in_one_call() {
        assert_eq!(normalize("STAMP DUTY STAMP DUTY PAID PAID").trim(), "");
    }

    #[test]
    fn phrase_split_across_lines_is_kept() {
        let raw = "stamp duty\npaid";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn cheque_text_indexes_lines() {
        let text = ChequeText::new("PAY John\n\nRM 10.00");
        assert_eq!(text.lines().len(), 3);
        assert_eq!(text.lines()[2], "RM 10.00");
    }
}
