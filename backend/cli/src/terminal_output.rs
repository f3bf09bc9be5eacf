//! Terminal output helpers: notes, colour, and plain tables for the review queue.

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false)
}

fn note(color: &str, glyph: &str, plain: &str, msg: &str) -> String {
    if supports_color() {
        format!("{color}{BOLD}{glyph}{RESET} {msg}")
    } else {
        format!("{plain}: {msg}")
    }
}

pub fn note_info(msg: &str) {
    println!("{}", note(CYAN, "ℹ", "INFO", msg));
}

pub fn note_warn(msg: &str) {
    println!("{}", note(YELLOW, "⚠", "WARN", msg));
}

pub fn note_error(msg: &str) {
    eprintln!("{}", note(RED, "✗", "ERROR", msg));
}

pub fn note_success(msg: &str) {
    println!("{}", note(GREEN, "✓", "OK", msg));
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// A table column: header plus an optional width cap.
pub struct Column {
    pub header: &'static str,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn new(header: &'static str) -> Self {
        Self { header, max_width: None }
    }

    pub fn capped(header: &'static str, max_width: usize) -> Self {
        Self { header, max_width: Some(max_width) }
    }
}

/// Render left-aligned rows under a header; over-long cells end in `…`.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, col)| truncate(row.get(i).map(String::as_str).unwrap_or(""), col.max_width))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain([col.header.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |row: Vec<&str>| -> String {
        let padded: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell}{}", " ".repeat(w.saturating_sub(cell.chars().count()))))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(columns.iter().map(|c| c.header).collect());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

fn truncate(cell: &str, max_width: Option<usize>) -> String {
    match max_width {
        Some(max) if cell.chars().count() > max && max > 0 => {
            let kept: String = cell.chars().take(max - 1).collect();
            format!("{kept}…")
        }
        _ => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_aligned_rows() {
        let table = render_table(
            &[Column::new("ID"), Column::new("PAYEE")],
            &[vec!["a1".into(), "John Doe".into()], vec!["b22".into(), "unknown".into()]],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "  ID   PAYEE");
        assert_eq!(lines[1], "  ---  --------");
        assert_eq!(lines[2], "  a1   John Doe");
        assert_eq!(lines[3], "  b22  unknown");
    }

    #[test]
    fn caps_wide_cells() {
        let table = render_table(
            &[Column::capped("NOTES", 6)],
            &[vec!["MICR line unparsable.".into()]],
        );
        assert!(table.lines().nth(2).unwrap().ends_with("MICR …"));
    }
}
