//! Synchronization sweep commands.
//!
//! Sweeps always complete from the caller's perspective; per-store failures
//! are logged, not raised. `sync store` does fail loudly for an unknown id.

use shopsync_core::StoreId;

use super::{build_service, connect};

/// Products then orders, across all active stores.
pub async fn all() -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = connect().await?;
    let service = build_service(&config, pool)?;

    tracing::info!("Starting store synchronization...");
    service.sync_all_stores().await;
    tracing::info!("Synchronization complete.");
    Ok(())
}

/// Product sweep only.
pub async fn products() -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = connect().await?;
    let service = build_service(&config, pool)?;

    service.sync_all_products().await;
    tracing::info!("Product synchronization complete.");
    Ok(())
}

/// Order sweep only.
pub async fn orders() -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = connect().await?;
    let service = build_service(&config, pool)?;

    service.sync_all_orders().await;
    tracing::info!("Order synchronization complete.");
    Ok(())
}

/// Products and orders for one store.
pub async fn store(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = connect().await?;
    let service = build_service(&config, pool)?;

    service.sync_store(StoreId::new(id)).await?;
    tracing::info!("Store {id} synchronized.");
    Ok(())
}
