//! Database operations for the local mirror (SQLite).
//!
//! # Tables
//!
//! - `stores` - Tenant-owned platform connections (the store registry)
//! - `products` - Normalized catalog mirror, unique per (store, platform id)
//! - `orders` / `order_items` - Normalized order mirror
//! - `logs` - Structured sync events
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/engine/migrations/` and run via:
//! ```bash
//! cargo run -p shopsync-cli -- migrate
//! ```
//!
//! # Concurrency
//!
//! Every upsert targets a single row addressed by its natural key, so
//! concurrent writes from different stores never contend on the same row and
//! no cross-store transactions exist.

pub mod logs;
pub mod orders;
pub mod products;
pub mod stores;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use logs::{LogRecord, LogRepository};
pub use orders::{Order, OrderItem, OrderRepository};
pub use products::{Product, ProductRepository};
pub use stores::{NewStore, Store, StoreRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a SQLite connection pool with sensible defaults.
///
/// The database file is created if missing; WAL mode and a busy timeout keep
/// concurrent store workers from tripping over each other's writes.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Run the embedded migrations against `pool`.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // A single connection keeps the in-memory database alive for the whole
    // pool lifetime.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid connection string")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations apply");
    pool
}
