//! Log table repository.
//!
//! Persists the structured events the engine emits so failures can be
//! queried after the fact; a sweep itself always "succeeds" from the
//! caller's perspective and partial failure is only visible here.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use shopsync_core::{LogEntry, LogId, LogLevel, StoreId};

use super::RepositoryError;

/// A persisted log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub id: LogId,
    pub store_id: Option<StoreId>,
    pub level: LogLevel,
    pub message: String,
    pub context: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Internal row type for SQLite queries.
#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: i64,
    store_id: Option<i64>,
    level: String,
    message: String,
    context: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for LogRecord {
    type Error = RepositoryError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let level = row.level.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid log level in database: {e}"))
        })?;
        let context = row
            .context
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid log context in database: {e}"))
            })?;

        Ok(Self {
            id: LogId::new(row.id),
            store_id: row.store_id.map(StoreId::new),
            level,
            message: row.message,
            context,
            created_at: row.created_at,
        })
    }
}

/// Repository for log database operations.
pub struct LogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LogRepository<'a> {
    /// Create a new log repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one log entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, entry: &LogEntry) -> Result<LogId, RepositoryError> {
        let context = entry
            .context
            .as_ref()
            .map(serde_json::Value::to_string);

        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO logs (store_id, level, message, context, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            ",
        )
        .bind(entry.store_id)
        .bind(entry.level.as_str())
        .bind(&entry.message)
        .bind(context)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(LogId::new(id))
    }

    /// Most recent log records, newest first, optionally filtered by level
    /// and/or store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored row fails to decode.
    pub async fn recent(
        &self,
        limit: i64,
        level: Option<LogLevel>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<LogRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, LogRow>(
            r"
            SELECT id, store_id, level, message, context, created_at
            FROM logs
            WHERE (?1 IS NULL OR level = ?1)
              AND (?2 IS NULL OR store_id = ?2)
            ORDER BY id DESC
            LIMIT ?3
            ",
        )
        .bind(level.map(|l| l.as_str()))
        .bind(store_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(LogRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed_store(pool: &SqlitePool, name: &str) -> StoreId {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO stores (user_id, name, platform, store_url, created_at, updated_at)
             VALUES (1, ?1, 'shopify', 'x.myshopify.com', ?2, ?2)
             RETURNING id",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .expect("seed store");
        StoreId::new(id)
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let pool = test_pool().await;
        let repo = LogRepository::new(&pool);

        repo.insert(
            &LogEntry::error("upstream said no")
                .context(serde_json::json!({"status": 500, "body": "oops"})),
        )
        .await
        .expect("insert");

        let records = repo.recent(10, None, None).await.expect("recent");
        assert_eq!(records.len(), 1);
        let record = records.first().expect("one record");
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message, "upstream said no");
        assert_eq!(
            record.context,
            Some(serde_json::json!({"status": 500, "body": "oops"}))
        );
        assert_eq!(record.store_id, None);
    }

    #[tokio::test]
    async fn test_recent_filters_by_level_and_store() {
        let pool = test_pool().await;
        let repo = LogRepository::new(&pool);
        let store_one = seed_store(&pool, "One").await;
        let store_two = seed_store(&pool, "Two").await;

        repo.insert(&LogEntry::info("sweep started")).await.expect("insert");
        repo.insert(&LogEntry::error("store one failed").store(store_one))
            .await
            .expect("insert");
        repo.insert(&LogEntry::error("store two failed").store(store_two))
            .await
            .expect("insert");

        let errors = repo
            .recent(10, Some(LogLevel::Error), None)
            .await
            .expect("errors");
        assert_eq!(errors.len(), 2);

        let store_two = repo
            .recent(10, None, Some(store_two))
            .await
            .expect("store filter");
        assert_eq!(store_two.len(), 1);
        assert_eq!(
            store_two.first().map(|r| r.message.as_str()),
            Some("store two failed")
        );
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let pool = test_pool().await;
        let repo = LogRepository::new(&pool);

        for n in 0..5 {
            repo.insert(&LogEntry::info(format!("event {n}")))
                .await
                .expect("insert");
        }

        let records = repo.recent(2, None, None).await.expect("recent");
        assert_eq!(
            records.iter().map(|r| r.message.as_str()).collect::<Vec<_>>(),
            vec!["event 4", "event 3"]
        );
    }
}
