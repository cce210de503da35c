//! Numeric series extraction for chart feeds.
//!
//! A pure view over stored rows: pick a section and a numeric field and get
//! ordered `(timestamp, value)` points. Rows where the field is absent or
//! not numeric are gaps in the series, not errors.

use crate::models::SnapshotRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Extract the series for `field` inside `section` across `rows`.
///
/// The field may live at the section's top level or nested under its `data`
/// key (sections store either plain payloads or probe envelopes); the nested
/// location wins when both exist.
pub fn extract_series(rows: &[SnapshotRecord], section: &str, field: &str) -> Vec<SeriesPoint> {
    rows.iter()
        .filter_map(|row| {
            numeric_field(&row.sections, section, field).map(|value| SeriesPoint {
                timestamp: row.created_at,
                value,
            })
        })
        .collect()
}

fn numeric_field(
    sections: &serde_json::Map<String, Value>,
    section: &str,
    field: &str,
) -> Option<f64> {
    let blob = sections.get(section)?;
    let nested = blob.get("data").and_then(|data| data.get(field));
    nested.or_else(|| blob.get(field))?.as_f64()
}
