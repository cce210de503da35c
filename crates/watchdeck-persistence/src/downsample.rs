//! Bucketed downsampling of snapshot rows.
//!
//! Rows are grouped into fixed-width time buckets; within a bucket the
//! last-seen row wins (recency over averaging), and only the most recent
//! `max_points` buckets are kept. Output is ascending by bucket start.

use crate::models::SnapshotRecord;
use std::collections::BTreeMap;
use watchdeck_core::RangeConfig;

/// Downsample `rows` to at most `config.max_points` entries.
///
/// Last-write-wins per bucket: for rows sharing a bucket, the one latest in
/// the input sequence replaces earlier ones. Bucket-aligned input is a fixed
/// point, so downsampling its own output is a no-op.
pub fn downsample(rows: Vec<SnapshotRecord>, config: &RangeConfig) -> Vec<SnapshotRecord> {
    let bucket_ms = config.bucket_width.as_millis() as i64;
    if bucket_ms == 0 {
        return rows;
    }

    let mut by_bucket: BTreeMap<i64, SnapshotRecord> = BTreeMap::new();
    for row in rows {
        let ts = row.created_at.timestamp_millis();
        let bucket = ts.div_euclid(bucket_ms) * bucket_ms;
        by_bucket.insert(bucket, row);
    }

    let skip = by_bucket.len().saturating_sub(config.max_points);
    by_bucket.into_values().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::time::Duration as StdDuration;
    use watchdeck_core::RangeKey;

    fn record(at: DateTime<Utc>, marker: i64) -> SnapshotRecord {
        let mut sections = serde_json::Map::new();
        sections.insert("marker".to_string(), serde_json::json!(marker));
        SnapshotRecord::at(at, sections)
    }

    fn marker(record: &SnapshotRecord) -> i64 {
        record.sections["marker"].as_i64().unwrap()
    }

    #[test]
    fn test_empty_input() {
        let out = downsample(Vec::new(), &RangeKey::Day.config());
        assert!(out.is_empty());
    }

    #[test]
    fn test_last_row_wins_within_bucket() {
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        let rows = vec![
            record(base, 1),
            record(base + Duration::minutes(2), 2),
            record(base + Duration::minutes(4), 3),
            record(base + Duration::minutes(6), 4),
        ];

        let out = downsample(rows, &RangeKey::Day.config());
        // 5-minute buckets: rows 1-3 collapse to the last inserted (3).
        assert_eq!(out.len(), 2);
        assert_eq!(marker(&out[0]), 3);
        assert_eq!(marker(&out[1]), 4);
    }

    #[test]
    fn test_never_exceeds_max_points_and_keeps_most_recent() {
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        // 2000 rows at 45s spacing span just under 25h: 300 buckets, so the
        // 288-point budget drops the oldest dozen.
        let rows: Vec<_> = (0..2000)
            .map(|i| record(base + Duration::seconds(i * 45), i))
            .collect();

        let config = RangeKey::Day.config();
        let out = downsample(rows, &config);
        assert!(out.len() <= config.max_points);
        assert_eq!(out.len(), 288);

        // Ascending, and the newest row survived.
        for pair in out.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
        assert_eq!(marker(out.last().unwrap()), 1999);

        // Each survivor is the last row inserted in its 5-minute window.
        let bucket_ms = config.bucket_width.as_millis() as i64;
        for pair in out.windows(2) {
            let gap = pair[1].created_at.timestamp_millis() - pair[0].created_at.timestamp_millis();
            assert!(gap > 0 && gap <= 2 * bucket_ms);
        }
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let rows: Vec<_> = (0..600)
            .map(|i| record(base + Duration::seconds(i * 97), i))
            .collect();

        let config = RangeKey::Day.config();
        let once = downsample(rows, &config);
        let twice = downsample(once.clone(), &config);

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.created_at, b.created_at);
            assert_eq!(marker(a), marker(b));
        }
    }

    #[test]
    fn test_fewer_rows_than_budget_pass_through() {
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let rows: Vec<_> = (0..5)
            .map(|i| record(base + Duration::hours(i), i))
            .collect();

        let config = RangeConfig {
            lookback: StdDuration::from_secs(86_400),
            bucket_width: StdDuration::from_secs(300),
            max_points: 288,
        };
        let out = downsample(rows, &config);
        assert_eq!(out.len(), 5);
    }
}
