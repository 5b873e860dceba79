//! Store registry repository.
//!
//! Stores are tenant-owned connection descriptors. Which credential fields a
//! store needs depends on its platform: WooCommerce uses a consumer key and
//! secret, Shopify an access token. The sync engine only ever reads stores
//! and soft-deletes are excluded from the active listing it consumes.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::SqlitePool;

use shopsync_core::{Platform, StoreId, UserId};

use super::RepositoryError;

/// A tenant's connected external store.
///
/// Implements `Debug` manually to redact credential fields.
#[derive(Clone)]
pub struct Store {
    pub id: StoreId,
    /// Owning tenant.
    pub user_id: UserId,
    /// Display name; empty names cause the sync engine to skip the store.
    pub name: String,
    /// Parsed platform tag. `None` when the stored value is empty or unknown,
    /// which also causes the sync engine to skip the store.
    pub platform: Option<Platform>,
    pub store_url: String,
    /// WooCommerce consumer key (redacted in debug output).
    pub api_key: Option<SecretString>,
    /// WooCommerce consumer secret (redacted in debug output).
    pub api_secret: Option<SecretString>,
    /// Shopify Admin API access token (redacted in debug output).
    pub access_token: Option<SecretString>,
    /// Soft-delete marker; presence means deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("platform", &self.platform)
            .field("store_url", &self.store_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("deleted_at", &self.deleted_at)
            .finish_non_exhaustive()
    }
}

/// Attributes for registering a new store.
pub struct NewStore {
    pub user_id: UserId,
    pub name: String,
    pub platform: Platform,
    pub store_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
}

/// Internal row type for SQLite queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i64,
    user_id: i64,
    name: String,
    platform: Option<String>,
    store_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    access_token: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            // Unknown platform strings are treated like missing ones: the
            // store stays listed but is skipped by sweeps.
            platform: row.platform.as_deref().and_then(|p| p.parse().ok()),
            store_url: row.store_url,
            api_key: row.api_key.map(SecretString::from),
            api_secret: row.api_secret.map(SecretString::from),
            access_token: row.access_token.map(SecretString::from),
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const STORE_COLUMNS: &str = "id, user_id, name, platform, store_url, api_key, api_secret, \
     access_token, deleted_at, created_at, updated_at";

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all stores that have not been soft-deleted, across all tenants.
    ///
    /// This is the listing the sync orchestrator sweeps over.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE deleted_at IS NULL ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// List every store, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Get a store by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// Register a new store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO stores
                (user_id, name, platform, store_url, api_key, api_secret,
                 access_token, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id
            ",
        )
        .bind(store.user_id)
        .bind(&store.name)
        .bind(store.platform.as_str())
        .bind(&store.store_url)
        .bind(&store.api_key)
        .bind(&store.api_secret)
        .bind(&store.access_token)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        self.get(StoreId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a store: flag it and exclude it from active listings while
    /// retaining the row. Returns `false` if the store was already deleted or
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE stores SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
