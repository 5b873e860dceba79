//! CLI command implementations.

pub mod logs;
pub mod migrate;
pub mod store;
pub mod sync;

use std::sync::Arc;

use sqlx::SqlitePool;

use shopsync_engine::{DbLogSink, LogSink, SyncConfig, SyncService};

/// Load configuration and open the database pool.
pub async fn connect() -> Result<(SyncConfig, SqlitePool), Box<dyn std::error::Error>> {
    let config = SyncConfig::from_env()?;
    let pool = shopsync_engine::db::create_pool(&config.database_url).await?;
    Ok((config, pool))
}

/// Build a sync service with the database-backed log sink.
pub fn build_service(
    config: &SyncConfig,
    pool: SqlitePool,
) -> Result<SyncService, Box<dyn std::error::Error>> {
    let sink: Arc<dyn LogSink> = Arc::new(DbLogSink::new(pool.clone()));
    Ok(SyncService::new(config, pool, sink)?)
}
