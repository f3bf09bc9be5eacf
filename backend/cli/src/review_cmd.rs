//! CLI Review Command
//!
//! Lists records waiting in the review queue.

use anyhow::Result;
use chequeforge_core::sentinel::UNKNOWN;
use chequeforge_store::{ChequeRecord, ChequeStore};

use crate::terminal_output::{note_info, render_table, Column};

pub async fn run(store: &ChequeStore) -> Result<()> {
    let pending = store.list_pending_review().await?;
    if pending.is_empty() {
        note_info("No cheques awaiting review.");
        return Ok(());
    }

    println!("\n{} cheque(s) awaiting review\n", pending.len());
    println!("{}", review_table(&pending));
    Ok(())
}

pub fn review_table(records: &[ChequeRecord]) -> String {
    let columns = [
        Column::new("ID"),
        Column::new("CREATED"),
        Column::capped("PAYEE", 24),
        Column::new("AMOUNT"),
        Column::capped("NOTES", 60),
    ];
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            let e = &record.extraction;
            vec![
                record.id.to_string(),
                record.created_at.format("%Y-%m-%d %H:%M").to_string(),
                e.payee_name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                e.amount
                    .map(|a| format!("{a:.2}"))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                e.review_notes.iter().collect::<Vec<_>>().join(" "),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chequeforge_core::ChequeExtraction;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn table_lists_pending_records() {
        let store = ChequeStore::in_memory().unwrap();
        let mut extraction = ChequeExtraction::default();
        extraction.amount = Some(Decimal::new(125050, 2));
        extraction.needs_review = true;
        extraction.review_notes.insert("Could not parse payee name.");
        let record = ChequeRecord::new(extraction, "/uploads/1-cheque.jpg");
        store.insert(&record).await.unwrap();

        let pending = store.list_pending_review().await.unwrap();
        let table = review_table(&pending);
        let row = table.lines().nth(2).unwrap();
        assert!(row.contains(&record.id.to_string()));
        assert!(row.contains("unknown"));
        assert!(row.contains("1250.50"));
        assert!(row.ends_with("Could not parse payee name."));
    }
}
