use chequeforge_core::ExtractionOutcome;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::anchor::{find_anchor, window};
use crate::normalizer::ChequeText;

static DATE_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:DATE|TARIKH)\b").unwrap());

/// Date surface forms in priority order. Digits are ASCII only.
static DATE_FORMS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let single = r"([0-9])[ \t]+";
    [
        r"\b([0-9]{1,2})\s*[/.\-]\s*([0-9]{1,2})\s*[/.\-]\s*([0-9]{4}|[0-9]{2})\b".to_string(),
        r"\b([0-9]{2})[ \t]+([0-9]{2})[ \t]+([0-9]{4}|[0-9]{2})\b".to_string(),
        r"\b([0-9]{2})([0-9]{2})([0-9]{4})\b".to_string(),
        r"\b([0-9]{2})([0-9]{2})([0-9]{2})\b".to_string(),
        format!(r"\b{}([0-9])\b", single.repeat(7)),
        format!(r"\b{}([0-9])\b", single.repeat(5)),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Leading digits OCR produces for a smudged single-digit month box.
const CONFUSABLE_LEADS: [char; 3] = ['8', '6', '9'];

/// Cheque date: the first date form found within three lines of DATE/TARIKH.
pub fn extract_date(text: &ChequeText) -> ExtractionOutcome<NaiveDate> {
    let lines = text.lines();
    let Some(hit) = find_anchor(lines, &DATE_ANCHOR) else {
        return ExtractionOutcome::not_found("Could not parse date: no DATE/TARIKH anchor found.");
    };
    let window = window(lines, &hit, 3, "\n");

    let Some(caps) = DATE_FORMS.iter().find_map(|re| re.captures(&window)) else {
        return ExtractionOutcome::not_found(
            "Could not parse date: no date pattern near the DATE/TARIKH anchor.",
        );
    };
    let raw = caps[0].to_string();
    let (day, month, year) = split_tokens(&caps);
    resolve(&raw, &day, &month, &year)
}

/// Day, month and year digit strings from any of the date forms.
fn split_tokens(caps: &Captures<'_>) -> (String, String, String) {
    let groups: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
    if groups.len() == 3 {
        return (groups[0].into(), groups[1].into(), groups[2].into());
    }
    // single-digit boxes: DD MM YY or DD MM YYYY
    let digits: Vec<char> = groups.concat().chars().collect();
    let part = |range: std::ops::Range<usize>| -> String {
        digits.get(range).unwrap_or_default().iter().collect()
    };
    (part(0..2), part(2..4), part(4..digits.len()))
}

fn resolve(raw: &str, day: &str, month: &str, year: &str) -> ExtractionOutcome<NaiveDate> {
    let invalid = || {
        ExtractionOutcome::not_found(format!(
            "Could not parse date: '{raw}' is not a valid calendar date."
        ))
    };
    let (Ok(mut d), Ok(mut m), Ok(mut y)) = (day.parse::<u32>(), month.parse::<u32>(), year.parse::<i32>())
    else {
        return invalid();
    };
    if year.len() == 2 {
        y += 2000;
    }

    let mut grade: Option<(u8, String)> = None;
    if m > 12 {
        if let Some(repaired) = repair_month(month) {
            grade = Some((85, format!("month '{month}' read as '{repaired}'")));
            m = repaired;
        } else if (1..=12).contains(&d) {
            grade = Some((50, format!("month '{month}' out of range, day and month swapped")));
            std::mem::swap(&mut d, &mut m);
        } else {
            return invalid();
        }
    }

    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => match grade {
            Some((confidence, rationale)) => ExtractionOutcome::graded(date, confidence, rationale),
            None => ExtractionOutcome::found(date),
        },
        None => invalid(),
    }
}

fn repair_month(token: &str) -> Option<u32> {
    let mut chars = token.chars();
    let (lead, digit) = (chars.next()?, chars.next()?);
    if chars.next().is_some() || !CONFUSABLE_LEADS.contains(&lead) {
        return None;
    }
    digit.to_digit(10).filter(|m| (1..=9).contains(m))
}
