//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One persisted snapshot: named section payloads collected in a single tick.
///
/// Rows are immutable after insert and removed only by retention pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub sections: Map<String, Value>,
}

impl SnapshotRecord {
    /// A new unsaved record stamped with the current time.
    pub fn new(sections: Map<String, Value>) -> Self {
        Self::at(Utc::now(), sections)
    }

    /// A new unsaved record with an explicit timestamp.
    pub fn at(created_at: DateTime<Utc>, sections: Map<String, Value>) -> Self {
        Self {
            id: None,
            created_at,
            sections,
        }
    }
}

/// Acknowledgement returned by a successful ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestAck {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Query metadata describing the fetched (pre-downsampling) row set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub total_rows: usize,
    pub oldest_at: Option<DateTime<Utc>>,
    pub newest_at: Option<DateTime<Utc>>,
}
