//! Sync orchestrator.
//!
//! Iterates the store registry, dispatches each store to its platform
//! adapter, and isolates per-store failures: a failing store is logged and
//! passed over, never allowed to abort a sweep or touch another store's
//! outcome. A full run is two sweeps - every store's products, then every
//! store's orders.
//!
//! # Concurrency
//!
//! Stores within a sweep fan out onto a bounded set of workers. Every upsert
//! is keyed by (store, platform-native id) and the entity tables are
//! disjoint, so concurrent stores never contend on a row and no transaction
//! spans more than one store. Each store unit runs under a timeout so a hung
//! upstream cannot stall the sweep.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use shopsync_core::{LogEntry, Platform, StoreId};

use crate::adapters::{ShopifySyncer, WooSyncer};
use crate::config::SyncConfig;
use crate::db::{RepositoryError, Store, StoreRepository};
use crate::logging::LogSink;

/// Which entity a sweep mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Products,
    Orders,
}

impl Sweep {
    const fn singular(self) -> &'static str {
        match self {
            Self::Products => "product",
            Self::Orders => "order",
        }
    }

    const fn plural(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
        }
    }
}

/// Errors from the single-store entry point. Sweeps never return errors;
/// their failures surface only as log entries.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store {0} not found")]
    StoreNotFound(StoreId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The sync engine's public face.
///
/// Cheap to clone; all state lives behind an `Arc`. Every operation is
/// idempotent and safe to call repeatedly or on a schedule.
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<SyncServiceInner>,
}

struct SyncServiceInner {
    pool: SqlitePool,
    sink: Arc<dyn LogSink>,
    shopify: ShopifySyncer,
    woo: WooSyncer,
    max_concurrent_stores: usize,
    store_timeout: Duration,
}

impl SyncService {
    /// Build a service from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(
        config: &SyncConfig,
        pool: SqlitePool,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let shopify = ShopifySyncer::new(
            http.clone(),
            pool.clone(),
            Arc::clone(&sink),
            config.shopify_api_version.clone(),
            config.lookback_days,
        );
        let woo = WooSyncer::new(
            http,
            pool.clone(),
            Arc::clone(&sink),
            config.lookback_days,
        );

        Ok(Self {
            inner: Arc::new(SyncServiceInner {
                pool,
                sink,
                shopify,
                woo,
                max_concurrent_stores: config.max_concurrent_stores.max(1),
                // Outer guard over the per-call HTTP timeout, so even a
                // stalled response body cannot pin a worker.
                store_timeout: Duration::from_secs(config.http_timeout_secs.saturating_mul(2)),
            }),
        })
    }

    /// Synchronize products and orders for all active stores: the products
    /// sweep runs to completion before the orders sweep starts.
    pub async fn sync_all_stores(&self) {
        self.inner
            .sink
            .write(LogEntry::info(
                "Starting synchronization for all active stores.",
            ))
            .await;
        self.sync_all_products().await;
        self.sync_all_orders().await;
        self.inner
            .sink
            .write(LogEntry::info("All active stores have been synchronized."))
            .await;
    }

    /// Synchronize products for all active stores.
    pub async fn sync_all_products(&self) {
        self.run_sweep(Sweep::Products).await;
    }

    /// Synchronize orders for all active stores.
    pub async fn sync_all_orders(&self) {
        self.run_sweep(Sweep::Orders).await;
    }

    /// Synchronize products and orders for a single store.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::StoreNotFound` for an unknown id. Adapter
    /// failures do not surface here; like the sweeps, they are only logged.
    pub async fn sync_store(&self, store_id: StoreId) -> Result<(), SyncError> {
        let store = StoreRepository::new(&self.inner.pool)
            .get(store_id)
            .await?
            .ok_or(SyncError::StoreNotFound(store_id))?;

        self.sync_store_unit(&store, Sweep::Products).await;
        self.sync_store_unit(&store, Sweep::Orders).await;
        Ok(())
    }

    /// One sweep: a fresh registry read, then a bounded fan-out over stores.
    async fn run_sweep(&self, sweep: Sweep) {
        let stores = match StoreRepository::new(&self.inner.pool).list_active().await {
            Ok(stores) => stores,
            Err(err) => {
                self.inner
                    .sink
                    .write(LogEntry::error(format!(
                        "Failed to list active stores: {err}"
                    )))
                    .await;
                return;
            }
        };

        if stores.is_empty() {
            self.inner
                .sink
                .write(LogEntry::info(format!(
                    "No active stores found to sync {} from.",
                    sweep.plural()
                )))
                .await;
            return;
        }

        let semaphore = Arc::new(Semaphore::new(self.inner.max_concurrent_stores));
        let mut tasks = JoinSet::new();
        for store in stores {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // Acquire fails only once the semaphore is closed, which
                // never happens here.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                service.sync_store_unit(&store, sweep).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                self.inner
                    .sink
                    .write(LogEntry::error(format!("Store sync task failed: {err}")))
                    .await;
            }
        }
    }

    /// Process one store for one sweep, inside its own error boundary.
    async fn sync_store_unit(&self, store: &Store, sweep: Sweep) {
        let platform = match store.platform {
            Some(platform) if !store.name.is_empty() => platform,
            _ => {
                self.inner
                    .sink
                    .write(
                        LogEntry::warning(format!(
                            "Skipping a store for {} sync due to missing name or platform.",
                            sweep.singular()
                        ))
                        .store(store.id),
                    )
                    .await;
                return;
            }
        };

        self.inner
            .sink
            .write(
                LogEntry::info(format!(
                    "Synchronizing {} for store: {} ({platform})",
                    sweep.plural(),
                    store.name
                ))
                .store(store.id),
            )
            .await;

        let run = async {
            match (platform, sweep) {
                (Platform::Shopify, Sweep::Products) => {
                    self.inner.shopify.sync_products(store).await;
                }
                (Platform::Shopify, Sweep::Orders) => {
                    self.inner.shopify.sync_orders(store).await;
                }
                (Platform::Woocommerce, Sweep::Products) => {
                    self.inner.woo.sync_products(store).await;
                }
                (Platform::Woocommerce, Sweep::Orders) => {
                    self.inner.woo.sync_orders(store).await;
                }
            }
        };

        if tokio::time::timeout(self.inner.store_timeout, run)
            .await
            .is_err()
        {
            self.inner
                .sink
                .write(
                    LogEntry::error(format!(
                        "Timed out synchronizing {} for store {}.",
                        sweep.plural(),
                        store.name
                    ))
                    .store(store.id),
                )
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::logging::DbLogSink;

    #[tokio::test]
    async fn test_sync_store_with_unknown_id_is_an_error() {
        let pool = test_pool().await;
        let sink: Arc<dyn LogSink> = Arc::new(DbLogSink::new(pool.clone()));
        let service = SyncService::new(
            &SyncConfig::with_database_url("sqlite::memory:"),
            pool,
            sink,
        )
        .expect("service");

        let result = service.sync_store(StoreId::new(999)).await;
        assert!(matches!(result, Err(SyncError::StoreNotFound(id)) if id == StoreId::new(999)));
    }
}
