//! `chequeforge-store` — durable records of processed cheques.

pub mod record;
pub mod sqlite;

pub use record::{ChequeRecord, RecordStatus, ReviewPatch};
pub use sqlite::ChequeStore;
