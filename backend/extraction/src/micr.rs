//! MICR line location and decomposition.
//!
//! The magnetic-ink line is the digit-densest line on the cheque. Its fields
//! are told apart by token width rather than position, because OCR often
//! reorders or merges the delimiter glyphs:
//!
//! | width | field |
//! |---|---|
//! | 6 (or 7) | cheque number |
//! | 7 | bank code (4) + branch code (3) |
//! | 8+ | payer account number |
//! | 2, trailing | transaction code |

use chequeforge_core::{ExtractionOutcome, MicrBlock};

use crate::normalizer::ChequeText;

/// A line needs at least this many digits to be considered.
pub const MIN_MICR_DIGITS: usize = 15;

/// Unicode MICR delimiters (transit, amount, on-us, dash).
const MICR_GLYPHS: [char; 4] = ['⑆', '⑇', '⑈', '⑉'];

const UNPARSABLE: &str = "MICR line unparsable.";

/// Locate and decode the MICR line.
pub fn decode_micr(text: &ChequeText) -> ExtractionOutcome<MicrBlock> {
    let Some(line) = locate(text.lines()) else {
        return ExtractionOutcome::not_found(format!(
            "MICR line unparsable: no line with at least {MIN_MICR_DIGITS} digits."
        ));
    };

    let tokens = fragments(line);
    if tokens.len() < 4 {
        return ExtractionOutcome::not_found(UNPARSABLE);
    }
    assign(line.trim(), &tokens)
}

/// The digit-densest qualifying line; glyphs break ties, then the later line.
fn locate(lines: &[String]) -> Option<&str> {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let digits = l.chars().filter(char::is_ascii_digit).count();
            let glyph = l.chars().any(|c| MICR_GLYPHS.contains(&c));
            (digits, glyph, i, l.as_str())
        })
        .filter(|(digits, ..)| *digits >= MIN_MICR_DIGITS)
        .max_by_key(|(digits, glyph, i, _)| (*digits, *glyph, *i))
        .map(|(.., l)| l)
}

/// Digit runs split on anything but letters; letters are OCR noise and dropped.
fn fragments(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in line.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if c.is_alphabetic() {
            continue;
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out.retain(|f| f.len() >= 2);
    out
}

fn assign(raw: &str, tokens: &[String]) -> ExtractionOutcome<MicrBlock> {
    let mut used = vec![false; tokens.len()];

    let longest = (0..tokens.len())
        .filter(|&i| tokens[i].len() >= 8)
        .min_by_key(|&i| std::cmp::Reverse(tokens[i].len()));
    let account = claim(tokens, &mut used, longest);
    let short = first_of_len(tokens, &used, 6).or_else(|| first_of_len(tokens, &used, 7));
    let cheque_no = claim(tokens, &mut used, short);
    let seven = first_of_len(tokens, &used, 7);
    let bank_branch = claim(tokens, &mut used, seven);
    let trailing = (0..tokens.len()).rev().find(|&i| !used[i] && tokens[i].len() == 2);
    let tran_code = claim(tokens, &mut used, trailing);

    let (bank_code, branch_code) = match bank_branch {
        Some(bb) => (Some(bb[..4].to_string()), Some(bb[4..].to_string())),
        None => (None, None),
    };

    let mut missing = Vec::new();
    for (present, name) in [
        (cheque_no.is_some(), "cheque number"),
        (bank_code.is_some(), "bank/branch code"),
        (account.is_some(), "account number"),
        (tran_code.is_some(), "transaction code"),
    ] {
        if !present {
            missing.push(name);
        }
    }
    if missing.len() > 2 {
        return ExtractionOutcome::not_found(format!(
            "MICR line unparsable: could not identify {}.",
            missing.join(", ")
        ));
    }

    let block = MicrBlock {
        raw: Some(raw.to_string()),
        cheque_no,
        bank_code,
        branch_code,
        payer_account_no: account,
        tran_code,
    };
    if missing.is_empty() {
        ExtractionOutcome::found(block)
    } else {
        ExtractionOutcome::graded(block, 60, format!("no {} token", missing.join(" or ")))
    }
}

fn claim(tokens: &[String], used: &mut [bool], index: Option<usize>) -> Option<String> {
    let i = index?;
    used[i] = true;
    Some(tokens[i].clone())
}

fn first_of_len(tokens: &[String], used: &[bool], len: usize) -> Option<usize> {
    (0..tokens.len()).find(|&i| !used[i] && tokens[i].len() == len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn micr(text: &str) -> ExtractionOutcome<MicrBlock> {
        decode_micr(&ChequeText::new(text))
    }

    #[test]
    fn splits_by_token_width() {
        let outcome = micr("PAY John\n⑈123456⑈ 1234567⑆ 0123456789⑈ 10");
        let block = outcome.value().unwrap();
        assert_eq!(outcome.confidence(), None);
        assert_eq!(block.cheque_no.as_deref(), Some("123456"));
        assert_eq!(block.bank_code.as_deref(), Some("1234"));
        assert_eq!(block.branch_code.as_deref(), Some("567"));
        assert_eq!(block.payer_account_no.as_deref(), Some("0123456789"));
        assert_eq!(block.tran_code.as_deref(), Some("10"));
        assert_eq!(block.raw.as_deref(), Some("⑈123456⑈ 1234567⑆ 0123456789⑈ 10"));
    }

    #[test]
    fn tolerates_reordering_and_letter_noise() {
        let block = micr("10 : 0123456789 - 1234567 | OO123456")
            .into_value()
            .unwrap();
        assert_eq!(block.cheque_no.as_deref(), Some("123456"));
        assert_eq!(block.bank_code.as_deref(), Some("1234"));
        assert_eq!(block.payer_account_no.as_deref(), Some("0123456789"));
        assert_eq!(block.tran_code.as_deref(), Some("10"));
    }

    #[test]
    fn seven_digit_cheque_number() {
        let block = micr("0001234 1234567 012345678901 20").into_value().unwrap();
        assert_eq!(block.cheque_no.as_deref(), Some("0001234"));
        assert_eq!(block.bank_code.as_deref(), Some("1234"));
        assert_eq!(block.branch_code.as_deref(), Some("567"));
    }

    #[test]
    fn no_micr_like_line() {
        let outcome = micr("PAY John Doe\nRM 1,250.00\nDate: 15/06/2024");
        assert!(outcome.reason().unwrap().starts_with("MICR line unparsable"));
    }

    #[test]
    fn too_few_fragments() {
        let outcome = micr("1234567890123456 7");
        assert_eq!(outcome.reason(), Some(UNPARSABLE));
    }

    #[test]
    fn partial_line_is_low_confidence() {
        let outcome = micr("123456 0123456789 55 99");
        assert_eq!(outcome.confidence(), Some(60));
        assert!(outcome.rationale().unwrap().contains("bank/branch code"));
        assert_eq!(outcome.value().unwrap().tran_code.as_deref(), Some("99"));
    }

    #[test]
    fn densest_line_wins() {
        let outcome = micr("111111 2222222 33333333 44\n123456 1234567 0123456789 10");
        assert_eq!(outcome.value().unwrap().cheque_no.as_deref(), Some("123456"));
    }
}
