//! Product mirror repository.
//!
//! Rows are keyed by (store, platform-native product id). A sync pass either
//! inserts a product or overwrites every mirrored field of the existing row
//! in place; products removed upstream are left as-is.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use shopsync_core::{NormalizedProduct, ProductId, StoreId};

use super::RepositoryError;

/// A mirrored catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub platform_product_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal row type for SQLite queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    store_id: i64,
    platform_product_id: String,
    name: String,
    sku: Option<String>,
    price: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            store_id: StoreId::new(row.store_id),
            platform_product_id: row.platform_product_id,
            name: row.name,
            sku: row.sku,
            price,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite the mirrored product for
    /// (`store_id`, `platform_product_id`).
    ///
    /// The write is a single atomic statement: all mirrored fields are
    /// replaced, never merged, and the row id is stable across passes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert(
        &self,
        store_id: StoreId,
        product: &NormalizedProduct,
    ) -> Result<ProductId, RepositoryError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO products
                (store_id, platform_product_id, name, sku, price, image_url,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (store_id, platform_product_id) DO UPDATE SET
                name = excluded.name,
                sku = excluded.sku,
                price = excluded.price,
                image_url = excluded.image_url,
                updated_at = excluded.updated_at
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(&product.platform_product_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price.to_string())
        .bind(&product.image_url)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(ProductId::new(id))
    }

    /// List all mirrored products for a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored price fails to parse.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, store_id, platform_product_id, name, sku, price,
                   image_url, created_at, updated_at
            FROM products
            WHERE store_id = ?1
            ORDER BY id
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}
