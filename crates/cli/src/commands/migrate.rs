//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shopsync migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPSYNC_DATABASE_URL` - SQLite connection string

use super::connect;

/// Apply the engine's embedded migrations.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (_config, pool) = connect().await?;

    tracing::info!("Running migrations...");
    shopsync_engine::db::run_migrations(&pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
