//! Store management commands.
//!
//! Registration normally happens through the web surfaces (install flow or
//! manual form); these commands cover operations and local setups. Removal
//! is always a soft delete.

use shopsync_core::{Platform, StoreId, UserId};
use shopsync_engine::db::{NewStore, StoreRepository};

use super::connect;

/// Register a new store.
#[allow(clippy::print_stdout)]
pub async fn add(
    name: &str,
    platform: &str,
    url: &str,
    user: i64,
    api_key: Option<String>,
    api_secret: Option<String>,
    access_token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let platform: Platform = platform.parse()?;

    // Flag credential gaps up front; the store would otherwise only fail at
    // its first sweep.
    match platform {
        Platform::Woocommerce if api_key.is_none() || api_secret.is_none() => {
            tracing::warn!(
                "WooCommerce stores need --api-key and --api-secret to sync; registering anyway"
            );
        }
        Platform::Shopify if access_token.is_none() => {
            tracing::warn!(
                "Shopify stores need --access-token to sync; registering anyway"
            );
        }
        _ => {}
    }

    let (_config, pool) = connect().await?;
    let store = StoreRepository::new(&pool)
        .create(&NewStore {
            user_id: UserId::new(user),
            name: name.to_owned(),
            platform,
            store_url: url.to_owned(),
            api_key,
            api_secret,
            access_token,
        })
        .await?;

    println!("Registered store {} ({})", store.id, store.name);
    Ok(())
}

/// List stores, optionally including soft-deleted ones.
#[allow(clippy::print_stdout)]
pub async fn list(include_deleted: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, pool) = connect().await?;
    let repo = StoreRepository::new(&pool);

    let stores = if include_deleted {
        repo.list_all().await?
    } else {
        repo.list_active().await?
    };

    if stores.is_empty() {
        println!("No stores registered.");
        return Ok(());
    }

    for store in stores {
        let platform = store
            .platform
            .map_or_else(|| "unknown".to_owned(), |p| p.to_string());
        let deleted = if store.deleted_at.is_some() {
            " [deleted]"
        } else {
            ""
        };
        println!(
            "{:>4}  {:<12} {:<30} {}{}",
            store.id, platform, store.name, store.store_url, deleted
        );
    }
    Ok(())
}

/// Soft-delete a store.
#[allow(clippy::print_stdout)]
pub async fn remove(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, pool) = connect().await?;

    if StoreRepository::new(&pool)
        .soft_delete(StoreId::new(id))
        .await?
    {
        println!("Store {id} removed from active listings (retained for audit).");
    } else {
        println!("Store {id} not found or already removed.");
    }
    Ok(())
}
