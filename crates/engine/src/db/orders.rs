//! Order mirror repository.
//!
//! Orders are keyed by (store, platform-native order id); their line items by
//! (order, platform-native line-item id). An order owns its items: deleting
//! an order cascades to them, though the sync engine itself never deletes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use shopsync_core::{NormalizedLineItem, NormalizedOrder, OrderId, OrderItemId, StoreId};

use super::RepositoryError;

/// A mirrored order header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub platform_order_id: String,
    pub customer_name: String,
    /// Platform-native creation timestamp string, mirrored verbatim.
    pub order_date: String,
    /// Platform-native status string.
    pub status: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A mirrored order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub line_item_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal row types for SQLite queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    store_id: i64,
    platform_order_id: String,
    customer_name: String,
    order_date: String,
    status: String,
    total_amount: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    line_item_id: String,
    product_name: String,
    quantity: i64,
    price: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_money(raw: &str, column: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid {column} in database: {e}"))
    })
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total_amount = parse_money(&row.total_amount, "total_amount")?;
        Ok(Self {
            id: OrderId::new(row.id),
            store_id: StoreId::new(row.store_id),
            platform_order_id: row.platform_order_id,
            customer_name: row.customer_name,
            order_date: row.order_date,
            status: row.status,
            total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let price = parse_money(&row.price, "price")?;
        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            line_item_id: row.line_item_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order and order-item database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite the mirrored order for
    /// (`store_id`, `platform_order_id`), returning the local row id so line
    /// items can attach to it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert_order(
        &self,
        store_id: StoreId,
        order: &NormalizedOrder,
    ) -> Result<OrderId, RepositoryError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO orders
                (store_id, platform_order_id, customer_name, order_date,
                 status, total_amount, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (store_id, platform_order_id) DO UPDATE SET
                customer_name = excluded.customer_name,
                order_date = excluded.order_date,
                status = excluded.status,
                total_amount = excluded.total_amount,
                updated_at = excluded.updated_at
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(&order.platform_order_id)
        .bind(&order.customer_name)
        .bind(&order.order_date)
        .bind(&order.status)
        .bind(order.total_amount.to_string())
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(OrderId::new(id))
    }

    /// Insert or overwrite a line item for (`order_id`, `line_item_id`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert_item(
        &self,
        order_id: OrderId,
        item: &NormalizedLineItem,
    ) -> Result<OrderItemId, RepositoryError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO order_items
                (order_id, line_item_id, product_name, quantity, price,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (order_id, line_item_id) DO UPDATE SET
                product_name = excluded.product_name,
                quantity = excluded.quantity,
                price = excluded.price,
                updated_at = excluded.updated_at
            RETURNING id
            ",
        )
        .bind(order_id)
        .bind(&item.line_item_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.price.to_string())
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(OrderItemId::new(id))
    }

    /// List all mirrored orders for a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored amount fails to parse.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, store_id, platform_order_id, customer_name, order_date,
                   status, total_amount, created_at, updated_at
            FROM orders
            WHERE store_id = ?1
            ORDER BY id
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// List the line items belonging to an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored price fails to parse.
    pub async fn items_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, line_item_id, product_name, quantity, price,
                   created_at, updated_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::stores::{NewStore, StoreRepository};
    use crate::db::test_pool;
    use shopsync_core::{Platform, UserId};

    async fn seed_store(pool: &SqlitePool) -> StoreId {
        StoreRepository::new(pool)
            .create(&NewStore {
                user_id: UserId::new(1),
                name: "Fixture".to_owned(),
                platform: Platform::Woocommerce,
                store_url: "http://woo.example.com".to_owned(),
                api_key: Some("ck".to_owned()),
                api_secret: Some("cs".to_owned()),
                access_token: None,
            })
            .await
            .expect("seed store")
            .id
    }

    fn order(total: &str) -> NormalizedOrder {
        NormalizedOrder {
            platform_order_id: "2001".to_owned(),
            customer_name: "Jane Doe".to_owned(),
            order_date: "2025-01-02T11:00:00".to_owned(),
            status: "processing".to_owned(),
            total_amount: total.parse().expect("decimal"),
        }
    }

    fn item(id: &str, name: &str) -> NormalizedLineItem {
        NormalizedLineItem {
            line_item_id: id.to_owned(),
            product_name: name.to_owned(),
            quantity: 1,
            price: "15.00".parse().expect("decimal"),
        }
    }

    #[tokio::test]
    async fn test_order_with_items_round_trip() {
        let pool = test_pool().await;
        let store_id = seed_store(&pool).await;
        let repo = OrderRepository::new(&pool);

        let order_id = repo.upsert_order(store_id, &order("50.00")).await.expect("order");
        repo.upsert_item(order_id, &item("3003", "Item 1")).await.expect("item 1");
        repo.upsert_item(order_id, &item("3004", "Item 2")).await.expect("item 2");

        let orders = repo.list_by_store(store_id).await.expect("orders");
        assert_eq!(orders.len(), 1);
        let items = repo.items_for_order(order_id).await.expect("items");
        assert_eq!(items.len(), 2);
        assert_eq!(
            items.iter().map(|i| i.line_item_id.as_str()).collect::<Vec<_>>(),
            vec!["3003", "3004"]
        );
    }

    #[tokio::test]
    async fn test_repeated_upsert_keeps_row_counts_stable() {
        let pool = test_pool().await;
        let store_id = seed_store(&pool).await;
        let repo = OrderRepository::new(&pool);

        for _ in 0..2 {
            let order_id = repo.upsert_order(store_id, &order("50.00")).await.expect("order");
            repo.upsert_item(order_id, &item("3003", "Item 1")).await.expect("item");
        }

        assert_eq!(repo.list_by_store(store_id).await.expect("orders").len(), 1);
        let order_id = repo.upsert_order(store_id, &order("50.00")).await.expect("order");
        assert_eq!(repo.items_for_order(order_id).await.expect("items").len(), 1);
    }

    #[tokio::test]
    async fn test_order_upsert_overwrites_header_fields() {
        let pool = test_pool().await;
        let store_id = seed_store(&pool).await;
        let repo = OrderRepository::new(&pool);

        let first = repo.upsert_order(store_id, &order("50.00")).await.expect("insert");
        let mut changed = order("62.00");
        changed.status = "completed".to_owned();
        let second = repo.upsert_order(store_id, &changed).await.expect("update");

        assert_eq!(first, second);
        let orders = repo.list_by_store(store_id).await.expect("orders");
        let row = orders.first().expect("one order");
        assert_eq!(row.status, "completed");
        assert_eq!(row.total_amount, "62.00".parse().expect("decimal"));
    }
}
