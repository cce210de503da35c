//! Snapshot store: ingest, range queries, and gated retention.

use crate::downsample::downsample;
use crate::error::Result;
use crate::models::{IngestAck, SnapshotMeta, SnapshotRecord};
use crate::repository::SnapshotRepository;
use crate::Database;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use watchdeck_core::RangeKey;

/// Hard ceiling on rows fetched per query, bounding transfer size.
pub const ROW_CEILING: i64 = 2000;

/// When and how often old rows are pruned.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Rows older than this are deleted.
    pub horizon: Duration,
    /// Minimum interval between sweeps.
    pub cooldown: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            horizon: RangeKey::longest_lookback(),
            cooldown: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Owns the snapshot row set: append-only ingest, downsampled reads, and a
/// cooldown-gated retention sweep. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    db: Database,
    retention: RetentionPolicy,
    /// Stamped when a sweep starts; the cooldown check-and-set is atomic
    /// under this lock so concurrent ingests trigger at most one sweep.
    last_sweep: Mutex<Option<Instant>>,
}

impl SnapshotStore {
    pub fn new(db: Database) -> Self {
        Self::with_retention(db, RetentionPolicy::default())
    }

    pub fn with_retention(db: Database, retention: RetentionPolicy) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                db,
                retention,
                last_sweep: Mutex::new(None),
            }),
        }
    }

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    /// Append one snapshot row from already-resolved section payloads.
    ///
    /// A due retention sweep runs afterwards; its failure never affects the
    /// ingest result.
    pub async fn ingest(&self, sections: Map<String, Value>) -> Result<IngestAck> {
        let record = SnapshotRecord::new(sections);
        let repo = SnapshotRepository::new(&self.inner.db);
        let id = repo.insert(&record).await?;

        self.maybe_prune().await;

        Ok(IngestAck {
            id,
            created_at: record.created_at,
        })
    }

    /// Rows within the range's lookback window, downsampled to its point
    /// budget, plus metadata about the fetched set.
    pub async fn query(&self, range: RangeKey) -> Result<(Vec<SnapshotRecord>, SnapshotMeta)> {
        let config = range.config();
        let cutoff = Utc::now() - chrono::Duration::seconds(config.lookback.as_secs() as i64);

        let rows = SnapshotRepository::new(&self.inner.db)
            .fetch_since(cutoff, ROW_CEILING)
            .await?;

        let meta = SnapshotMeta {
            total_rows: rows.len(),
            oldest_at: rows.first().map(|r| r.created_at),
            newest_at: rows.last().map(|r| r.created_at),
        };

        Ok((downsample(rows, &config), meta))
    }

    /// Run the retention sweep if the cooldown has elapsed.
    ///
    /// Returns the number of pruned rows when a sweep ran, `None` when it was
    /// still cooling down. Sweep errors are logged and swallowed.
    pub async fn maybe_prune(&self) -> Option<u64> {
        {
            let mut last_sweep = self.inner.last_sweep.lock();
            match *last_sweep {
                Some(at) if at.elapsed() < self.inner.retention.cooldown => return None,
                _ => *last_sweep = Some(Instant::now()),
            }
        }

        let horizon = chrono::Duration::seconds(self.inner.retention.horizon.as_secs() as i64);
        let cutoff = Utc::now() - horizon;

        match SnapshotRepository::new(&self.inner.db)
            .delete_older_than(cutoff)
            .await
        {
            Ok(pruned) => {
                if pruned > 0 {
                    info!(rows = pruned, "retention sweep pruned old snapshots");
                }
                Some(pruned)
            }
            Err(e) => {
                warn!(error = %e, "retention sweep failed");
                Some(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    fn sections() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("openclaw".to_string(), json!({ "status": "online" }));
        map
    }

    fn policy(horizon: Duration, cooldown: Duration) -> RetentionPolicy {
        RetentionPolicy { horizon, cooldown }
    }

    #[tokio::test]
    async fn test_ingest_returns_ack_and_persists() {
        let db = Database::in_memory().await.unwrap();
        let store = SnapshotStore::new(db);

        let ack = store.ingest(sections()).await.unwrap();
        assert_eq!(ack.id, 1);

        let (rows, meta) = store.query(RangeKey::Day).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(meta.total_rows, 1);
        assert_eq!(meta.oldest_at, meta.newest_at);
    }

    #[tokio::test]
    async fn test_query_empty_store() {
        let db = Database::in_memory().await.unwrap();
        let store = SnapshotStore::new(db);

        let (rows, meta) = store.query(RangeKey::Week).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(meta.total_rows, 0);
        assert!(meta.oldest_at.is_none());
        assert!(meta.newest_at.is_none());
    }

    #[tokio::test]
    async fn test_retention_is_gated_by_cooldown() {
        let db = Database::in_memory().await.unwrap();
        let store =
            SnapshotStore::with_retention(db, policy(Duration::from_secs(0), Duration::from_secs(3600)));

        // First sweep runs and stamps the cooldown; the second is gated.
        assert!(store.maybe_prune().await.is_some());
        assert!(store.maybe_prune().await.is_none());
        assert!(store.maybe_prune().await.is_none());
    }

    #[tokio::test]
    async fn test_retention_runs_again_after_cooldown() {
        let db = Database::in_memory().await.unwrap();
        let store = SnapshotStore::with_retention(
            db,
            policy(Duration::from_secs(0), Duration::from_millis(20)),
        );

        assert!(store.maybe_prune().await.is_some());
        assert!(store.maybe_prune().await.is_none());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.maybe_prune().await.is_some());
    }

    #[tokio::test]
    async fn test_retention_prunes_rows_past_horizon() {
        let db = Database::in_memory().await.unwrap();
        let repo_db = db.clone();
        let store = SnapshotStore::with_retention(
            db,
            policy(Duration::from_secs(30 * 24 * 60 * 60), Duration::from_secs(0)),
        );

        let repo = SnapshotRepository::new(&repo_db);
        let old = SnapshotRecord::at(Utc::now() - ChronoDuration::days(45), sections());
        repo.insert(&old).await.unwrap();

        // The ingest that trips the sweep survives; the expired row goes.
        store.ingest(sections()).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_ingests_trigger_one_sweep() {
        let db = Database::in_memory().await.unwrap();
        let store =
            SnapshotStore::with_retention(db, policy(Duration::from_secs(0), Duration::from_secs(3600)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.maybe_prune().await }));
        }

        let mut swept = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                swept += 1;
            }
        }
        assert_eq!(swept, 1);
    }
}
