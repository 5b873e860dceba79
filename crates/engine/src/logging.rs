//! Log sink for the engine's structured events.
//!
//! The engine reports per-store lifecycle events through [`LogSink`] and
//! never waits on their durability: the provided [`DbLogSink`] mirrors each
//! entry to `tracing` and persists it to the `logs` table, and a failed
//! insert is itself only traced.

use async_trait::async_trait;
use sqlx::SqlitePool;

use shopsync_core::{LogEntry, LogLevel};

use crate::db::LogRepository;

/// Destination for the engine's structured log events.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Record one event. Implementations must not fail the caller.
    async fn write(&self, entry: LogEntry);
}

/// Sink that persists entries to the `logs` table and mirrors them to
/// `tracing`.
#[derive(Clone)]
pub struct DbLogSink {
    pool: SqlitePool,
}

impl DbLogSink {
    /// Create a sink writing to `pool`.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogSink for DbLogSink {
    async fn write(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info => {
                tracing::info!(store_id = ?entry.store_id, "{}", entry.message);
            }
            LogLevel::Warning => {
                tracing::warn!(store_id = ?entry.store_id, "{}", entry.message);
            }
            LogLevel::Error => {
                tracing::error!(store_id = ?entry.store_id, "{}", entry.message);
            }
        }

        // Persistence is best-effort; a sink failure stays in the sink.
        if let Err(err) = LogRepository::new(&self.pool).insert(&entry).await {
            tracing::warn!(error = %err, "failed to persist log entry");
        }
    }
}
