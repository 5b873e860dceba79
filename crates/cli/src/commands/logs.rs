//! Log inspection command.
//!
//! Sync failures never surface at the sweep's exit code; this is where they
//! become visible.

use shopsync_core::{LogLevel, StoreId};
use shopsync_engine::db::LogRepository;

use super::connect;

/// Print recent log entries, newest first.
#[allow(clippy::print_stdout)]
pub async fn show(
    level: Option<&str>,
    store: Option<i64>,
    limit: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = level.map(str::parse::<LogLevel>).transpose()?;
    let store_id = store.map(StoreId::new);

    let (_config, pool) = connect().await?;
    let records = LogRepository::new(&pool)
        .recent(limit, level, store_id)
        .await?;

    if records.is_empty() {
        println!("No log entries match.");
        return Ok(());
    }

    for record in records {
        let store = record
            .store_id
            .map_or_else(|| "-".to_owned(), |id| id.to_string());
        let context = record
            .context
            .map_or_else(String::new, |c| format!("  {c}"));
        println!(
            "{}  {:<7} store={:<4} {}{}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.level,
            store,
            record.message,
            context
        );
    }
    Ok(())
}
