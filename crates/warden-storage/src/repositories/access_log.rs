#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::AccessLog;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository trait for the access audit trail
///
/// Uses native async trait methods (Edition 2024).
pub trait AccessLogRepository: Send + Sync {
    /// Append an access log entry
    async fn create(&self, log: &AccessLog) -> StorageResult<i64>;

    /// Find an entry by primary key
    async fn find_by_id(&self, id: i64) -> StorageResult<AccessLog>;

    /// Most recent entries, newest first
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Most recent rejected credentials (security monitoring)
    async fn find_recent_denied(&self, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Entries for one credential (card hex or `"PIN"`)
    async fn find_by_credential(&self, credential: &str, limit: i64)
    -> StorageResult<Vec<AccessLog>>;

    /// All entries within a time range
    async fn find_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<AccessLog>>;

    /// Count rejected credentials since a point in time
    async fn count_denied_since(&self, since: DateTime<Utc>) -> StorageResult<i64>;
}

/// SQLite implementation of AccessLogRepository
#[derive(Debug, Clone)]
pub struct SqliteAccessLogRepository {
    pool: SqlitePool,
}

impl SqliteAccessLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessLogRepository for SqliteAccessLogRepository {
    async fn create(&self, log: &AccessLog) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_logs (modality, credential, granted, state, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.modality)
        .bind(&log.credential)
        .bind(log.granted)
        .bind(&log.state)
        .bind(log.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<AccessLog> {
        sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, modality, credential, granted, state, timestamp, created_at
            FROM access_logs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound {
            entity_type: "access_log".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        })
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, modality, credential, granted, state, timestamp, created_at
            FROM access_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_recent_denied(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, modality, credential, granted, state, timestamp, created_at
            FROM access_logs
            WHERE granted = 0
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_credential(
        &self,
        credential: &str,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, modality, credential, granted, state, timestamp, created_at
            FROM access_logs
            WHERE credential = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(credential)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, modality, credential, granted, state, timestamp, created_at
            FROM access_logs
            WHERE timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_denied_since(&self, since: DateTime<Utc>) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM access_logs
            WHERE granted = 0 AND timestamp >= ?
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
