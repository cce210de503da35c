//! Snapshot row repository

use crate::{error::Result, models::SnapshotRecord, Database};
use chrono::{DateTime, Utc};
use sqlx::Row;

/// Repository for snapshot rows
pub struct SnapshotRepository<'a> {
    db: &'a Database,
}

impl<'a> SnapshotRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new snapshot row
    pub async fn insert(&self, record: &SnapshotRecord) -> Result<i64> {
        let sections = serde_json::to_string(&record.sections)?;

        let result = sqlx::query(
            r#"
            INSERT INTO snapshots (created_at, sections)
            VALUES (?, ?)
            "#,
        )
        .bind(record.created_at.to_rfc3339())
        .bind(sections)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get rows at or after `cutoff`, oldest first, capped at `limit`
    pub async fn fetch_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SnapshotRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM snapshots
            WHERE created_at >= ?
            ORDER BY created_at ASC
            LIMIT ?
            "#,
        )
        .bind(cutoff.to_rfc3339())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    /// Delete rows older than `cutoff`
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM snapshots WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Get total row count
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM snapshots")
            .fetch_one(self.db.pool())
            .await?;

        Ok(row.get::<i64, _>("count"))
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<SnapshotRecord> {
        let sections = serde_json::from_str(row.get::<&str, _>("sections"))?;

        Ok(SnapshotRecord {
            id: Some(row.get("id")),
            created_at: DateTime::parse_from_rfc3339(row.get::<&str, _>("created_at"))
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sections(label: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("openclaw".to_string(), json!({ "status": label }));
        map
    }

    #[tokio::test]
    async fn test_insert_and_fetch_roundtrip() {
        let db = Database::in_memory().await.unwrap();
        let repo = SnapshotRepository::new(&db);

        let record = SnapshotRecord::new(sections("online"));
        let id = repo.insert(&record).await.unwrap();
        assert_eq!(id, 1);

        let rows = repo
            .fetch_since(record.created_at - Duration::minutes(1), 100)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, Some(1));
        assert_eq!(rows[0].sections["openclaw"]["status"], "online");
    }

    #[tokio::test]
    async fn test_fetch_since_excludes_older_and_orders_ascending() {
        let db = Database::in_memory().await.unwrap();
        let repo = SnapshotRepository::new(&db);
        let base = Utc::now();

        for minutes_ago in [90i64, 30, 10] {
            let record =
                SnapshotRecord::at(base - Duration::minutes(minutes_ago), sections("online"));
            repo.insert(&record).await.unwrap();
        }

        let rows = repo.fetch_since(base - Duration::hours(1), 100).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].created_at < rows[1].created_at);
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let db = Database::in_memory().await.unwrap();
        let repo = SnapshotRepository::new(&db);
        let base = Utc::now();

        repo.insert(&SnapshotRecord::at(base - Duration::days(40), sections("online")))
            .await
            .unwrap();
        repo.insert(&SnapshotRecord::at(base, sections("online")))
            .await
            .unwrap();

        let deleted = repo.delete_older_than(base - Duration::days(30)).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
