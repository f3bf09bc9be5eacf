/// SQLite-backed cheque record store.
///
/// The extraction is stored as a JSON payload next to the columns the review
/// queue filters and sorts on. The connection sits behind an async mutex so
/// the store can be shared across request handlers.
use std::path::Path;
use std::str::FromStr;

use chequeforge_core::ChequeError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::record::{ChequeRecord, RecordStatus, ReviewPatch};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cheques (
        id           TEXT PRIMARY KEY,
        extraction   TEXT NOT NULL,
        image_url    TEXT NOT NULL,
        needs_review INTEGER NOT NULL,
        status       TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cheques_review ON cheques(needs_review, status);
    CREATE INDEX IF NOT EXISTS idx_cheques_created ON cheques(created_at);";

const SELECT_COLUMNS: &str =
    "SELECT id, extraction, image_url, status, created_at, updated_at FROM cheques";

pub struct ChequeStore {
    conn: Mutex<Connection>,
}

impl ChequeStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChequeError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(storage)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(storage)?;
        let store = Self::init(conn)?;
        info!(path = %path.display(), "Cheque store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, ChequeError> {
        Self::init(Connection::open_in_memory().map_err(storage)?)
    }

    fn init(conn: Connection) -> Result<Self, ChequeError> {
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub async fn insert(&self, record: &ChequeRecord) -> Result<(), ChequeError> {
        let conn = self.conn.lock().await;
        let extraction = serde_json::to_string(&record.extraction).map_err(storage)?;
        conn.execute(
            "INSERT INTO cheques (id, extraction, image_url, needs_review, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                extraction,
                record.image_url,
                record.needs_review(),
                record.status.to_string(),
                timestamp(&record.created_at),
                timestamp(&record.updated_at),
            ],
        )
        .map_err(storage)?;
        debug!(id = %record.id, needs_review = record.needs_review(), "Inserted cheque record");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<ChequeRecord, ChequeError> {
        let conn = self.conn.lock().await;
        fetch(&conn, id)?.ok_or_else(|| ChequeError::NotFound(id.to_string()))
    }

    /// Records awaiting a reviewer, newest first.
    pub async fn list_pending_review(&self) -> Result<Vec<ChequeRecord>, ChequeError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "{SELECT_COLUMNS} WHERE needs_review = 1 AND status = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql).map_err(storage)?;
        let rows = stmt
            .query_map(params![RecordStatus::Processed.to_string()], read_row)
            .map_err(storage)?;
        let records = rows
            .map(|row| row.map_err(storage).and_then(into_record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Apply reviewer corrections and mark the record reviewed.
    pub async fn apply_review(&self, id: Uuid, patch: ReviewPatch) -> Result<ChequeRecord, ChequeError> {
        let conn = self.conn.lock().await;
        let mut record = fetch(&conn, id)?.ok_or_else(|| ChequeError::NotFound(id.to_string()))?;
        patch.apply(&mut record);

        let extraction = serde_json::to_string(&record.extraction).map_err(storage)?;
        conn.execute(
            "UPDATE cheques SET extraction = ?2, needs_review = ?3, status = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                id.to_string(),
                extraction,
                record.needs_review(),
                record.status.to_string(),
                timestamp(&record.updated_at),
            ],
        )
        .map_err(storage)?;
        info!(id = %id, "Review applied");
        Ok(record)
    }

    pub async fn count(&self) -> Result<usize, ChequeError> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT COUNT(*) FROM cheques", [], |row| row.get(0))
            .map_err(storage)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

type RawRow = (String, String, String, String, String, String);

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn fetch(conn: &Connection, id: Uuid) -> Result<Option<ChequeRecord>, ChequeError> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
    conn.query_row(&sql, params![id.to_string()], read_row)
        .optional()
        .map_err(storage)?
        .map(into_record)
        .transpose()
}

fn into_record(
    (id, extraction, image_url, status, created_at, updated_at): RawRow,
) -> Result<ChequeRecord, ChequeError> {
    Ok(ChequeRecord {
        id: Uuid::parse_str(&id).map_err(storage)?,
        extraction: serde_json::from_str(&extraction).map_err(storage)?,
        image_url,
        status: RecordStatus::from_str(&status).map_err(storage)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ChequeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(storage)
}

fn storage(e: impl std::fmt::Display) -> ChequeError {
    ChequeError::Storage(e.to_string())
}
