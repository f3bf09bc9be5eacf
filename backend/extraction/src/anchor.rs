//! Anchor lookup and bounded search windows.
//!
//! Extractors never scan the whole document for a value pattern; they first
//! find a label line, then look only at what follows it.

use regex::Regex;

/// A label found on a line, with the text that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorHit<'a> {
    pub line_index: usize,
    /// Remainder of the line after the last anchor match on it.
    pub rest: &'a str,
}

/// First line matching `anchor`.
pub fn find_anchor<'a>(lines: &'a [String], anchor: &Regex) -> Option<AnchorHit<'a>> {
    lines.iter().enumerate().find_map(|(line_index, line)| {
        anchor.find_iter(line).last().map(|m| AnchorHit {
            line_index,
            rest: &line[m.end()..],
        })
    })
}

/// First line matching `anchor`, with the remainder after the first match.
///
/// For labels that may legitimately repeat inside the value itself.
pub fn find_anchor_first<'a>(lines: &'a [String], anchor: &Regex) -> Option<AnchorHit<'a>> {
    lines.iter().enumerate().find_map(|(line_index, line)| {
        anchor.find(line).map(|m| AnchorHit {
            line_index,
            rest: &line[m.end()..],
        })
    })
}

/// The next `count` non-blank lines after the anchor line.
pub fn following_lines<'a>(lines: &'a [String], hit: &AnchorHit<'_>, count: usize) -> Vec<&'a str> {
    lines
        .iter()
        .skip(hit.line_index + 1)
        .map(String::as_str)
        .filter(|l| !l.trim().is_empty())
        .take(count)
        .collect()
}

/// Anchor remainder plus up to `extra` following lines, joined by `sep`.
pub fn window(lines: &[String], hit: &AnchorHit<'_>, extra: usize, sep: &str) -> String {
    let mut parts = vec![hit.rest];
    parts.extend(following_lines(lines, hit, extra));
    parts.join(sep)
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
