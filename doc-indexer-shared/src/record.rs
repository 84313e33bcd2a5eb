//! Source-of-record types.
//!
//! Records live in the record database; the pipeline reconciles their
//! indexing status after embeddings are stored.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Indexing status surfaced on records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::NotStarted => "NOT_STARTED",
            RecordStatus::InProgress => "IN_PROGRESS",
            RecordStatus::Completed => "COMPLETED",
            RecordStatus::Failed => "FAILED",
        }
    }
}

/// A record document as stored in the record database.
///
/// Records are open documents; the pipeline only touches the status fields
/// and passes everything else through untouched on upsert.
pub type Record = Map<String, Value>;

/// Current time as epoch milliseconds, the timestamp format records use.
pub fn epoch_millis_now() -> i64 {
    Utc::now().timestamp_millis()
}
