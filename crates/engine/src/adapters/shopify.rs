//! Shopify platform adapter.
//!
//! Speaks the Shopify Admin REST dialect: endpoints are composed from the
//! store's domain (any scheme prefix is stripped first, requests always go
//! out over HTTPS) and authenticated with the store's access token header.
//! Responses are translated into normalized records and upserted.
//!
//! A sync fetches a single page at the platform's 250-row ceiling; paging
//! beyond that is out of scope.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use shopsync_core::{LogEntry, NormalizedLineItem, NormalizedOrder, NormalizedProduct};

use super::MoneyField;
use crate::db::{OrderRepository, ProductRepository, RepositoryError, Store};
use crate::logging::LogSink;

/// Shopify's maximum page size; a sync fetches exactly one page.
const PAGE_LIMIT: u32 = 250;

/// Access-token header for the Admin REST API.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Errors that can escape a fetch-and-upsert attempt (and are then absorbed
/// at the operation boundary).
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP transport or body-decode failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local persistence failure.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Syncer for Shopify stores.
pub struct ShopifySyncer {
    http: reqwest::Client,
    pool: SqlitePool,
    sink: Arc<dyn LogSink>,
    api_version: String,
    lookback_days: i64,
}

impl ShopifySyncer {
    /// Create a syncer.
    pub fn new(
        http: reqwest::Client,
        pool: SqlitePool,
        sink: Arc<dyn LogSink>,
        api_version: impl Into<String>,
        lookback_days: i64,
    ) -> Self {
        Self {
            http,
            pool,
            sink,
            api_version: api_version.into(),
            lookback_days,
        }
    }

    /// Mirror the store's catalog. Never returns an error; failures are
    /// logged against the store and swallowed.
    pub async fn sync_products(&self, store: &Store) {
        if let Err(err) = self.try_sync_products(store).await {
            self.sink
                .write(
                    LogEntry::error(format!(
                        "Shopify product sync error for store {}: {err}",
                        store.name
                    ))
                    .store(store.id),
                )
                .await;
        }
    }

    /// Mirror the store's recent orders. Never returns an error; failures
    /// are logged against the store and swallowed.
    pub async fn sync_orders(&self, store: &Store) {
        if let Err(err) = self.try_sync_orders(store).await {
            self.sink
                .write(
                    LogEntry::error(format!(
                        "Shopify order sync error for store {}: {err}",
                        store.name
                    ))
                    .store(store.id),
                )
                .await;
        }
    }

    async fn try_sync_products(&self, store: &Store) -> Result<(), ShopifyError> {
        let url = products_url(&store.store_url, &self.api_version);
        let response = self
            .http
            .get(&url)
            .header(ACCESS_TOKEN_HEADER, access_token(store))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.sink
                .write(
                    LogEntry::error(format!(
                        "Shopify API product sync failed for store {}.",
                        store.name
                    ))
                    .store(store.id)
                    .context(serde_json::json!({
                        "status": status.as_u16(),
                        "body": body,
                    })),
                )
                .await;
            return Ok(());
        }

        let payload: ProductsResponse = response.json().await?;
        let repo = ProductRepository::new(&self.pool);
        for product in payload.products {
            repo.upsert(store.id, &normalize_product(product)).await?;
        }

        self.sink
            .write(
                LogEntry::info(format!(
                    "Shopify products synchronized successfully for store: {}",
                    store.name
                ))
                .store(store.id),
            )
            .await;
        Ok(())
    }

    async fn try_sync_orders(&self, store: &Store) -> Result<(), ShopifyError> {
        let created_at_min = (Utc::now() - chrono::Duration::days(self.lookback_days))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = orders_url(&store.store_url, &self.api_version, &created_at_min);
        let response = self
            .http
            .get(&url)
            .header(ACCESS_TOKEN_HEADER, access_token(store))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.sink
                .write(
                    LogEntry::error(format!(
                        "Shopify API order sync failed for store {}.",
                        store.name
                    ))
                    .store(store.id)
                    .context(serde_json::json!({
                        "status": status.as_u16(),
                        "body": body,
                    })),
                )
                .await;
            return Ok(());
        }

        let payload: OrdersResponse = response.json().await?;
        let repo = OrderRepository::new(&self.pool);
        for order in payload.orders {
            let order_id = repo.upsert_order(store.id, &normalize_order(&order)).await?;
            for item in &order.line_items {
                repo.upsert_item(order_id, &normalize_line_item(item)).await?;
            }
        }

        self.sink
            .write(
                LogEntry::info(format!(
                    "Shopify orders synchronized successfully for store: {}",
                    store.name
                ))
                .store(store.id),
            )
            .await;
        Ok(())
    }
}

fn access_token(store: &Store) -> String {
    store
        .access_token
        .as_ref()
        .map_or_else(String::new, |t| t.expose_secret().to_owned())
}

/// Store domain with any scheme prefix stripped.
fn host_of(store_url: &str) -> &str {
    store_url
        .strip_prefix("https://")
        .or_else(|| store_url.strip_prefix("http://"))
        .unwrap_or(store_url)
        .trim_end_matches('/')
}

fn products_url(store_url: &str, api_version: &str) -> String {
    let host = host_of(store_url);
    format!("https://{host}/admin/api/{api_version}/products.json?limit={PAGE_LIMIT}")
}

fn orders_url(store_url: &str, api_version: &str, created_at_min: &str) -> String {
    let host = host_of(store_url);
    format!(
        "https://{host}/admin/api/{api_version}/orders.json?status=any&created_at_min={created_at_min}&limit={PAGE_LIMIT}"
    )
}

// =============================================================================
// Upstream payload shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
struct ShopifyProduct {
    id: i64,
    title: String,
    #[serde(default)]
    variants: Vec<ShopifyVariant>,
    image: Option<ShopifyImage>,
}

#[derive(Debug, Deserialize)]
struct ShopifyVariant {
    sku: Option<String>,
    price: Option<MoneyField>,
}

#[derive(Debug, Deserialize)]
struct ShopifyImage {
    src: String,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    orders: Vec<ShopifyOrder>,
}

#[derive(Debug, Deserialize)]
struct ShopifyOrder {
    id: i64,
    created_at: String,
    financial_status: String,
    total_price: MoneyField,
    customer: Option<ShopifyCustomer>,
    #[serde(default)]
    line_items: Vec<ShopifyLineItem>,
}

#[derive(Debug, Deserialize)]
struct ShopifyCustomer {
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShopifyLineItem {
    id: i64,
    name: String,
    quantity: i64,
    price: MoneyField,
}

// =============================================================================
// Normalization
// =============================================================================

fn normalize_product(product: ShopifyProduct) -> NormalizedProduct {
    let variant = product.variants.first();
    NormalizedProduct {
        platform_product_id: product.id.to_string(),
        name: product.title,
        sku: Some(
            variant
                .and_then(|v| v.sku.clone())
                .unwrap_or_else(|| "N/A".to_owned()),
        ),
        price: variant
            .and_then(|v| v.price.as_ref())
            .map_or(Decimal::ZERO, MoneyField::to_decimal),
        image_url: product.image.map(|i| i.src),
    }
}

fn normalize_order(order: &ShopifyOrder) -> NormalizedOrder {
    let first = order
        .customer
        .as_ref()
        .and_then(|c| c.first_name.clone())
        .unwrap_or_default();
    let last = order
        .customer
        .as_ref()
        .and_then(|c| c.last_name.clone())
        .unwrap_or_default();

    NormalizedOrder {
        platform_order_id: order.id.to_string(),
        // Plain first + " " + last, untrimmed: a missing part leaves a
        // leading or trailing space, as upstream consumers expect.
        customer_name: format!("{first} {last}"),
        order_date: order.created_at.clone(),
        status: order.financial_status.clone(),
        total_amount: order.total_price.to_decimal(),
    }
}

fn normalize_line_item(item: &ShopifyLineItem) -> NormalizedLineItem {
    NormalizedLineItem {
        line_item_id: item.id.to_string(),
        product_name: item.name.clone(),
        quantity: item.quantity,
        price: item.price.to_decimal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_url_strips_scheme_and_carries_page_limit() {
        let url = products_url("https://test-shopify.myshopify.com", "2023-10");
        assert_eq!(
            url,
            "https://test-shopify.myshopify.com/admin/api/2023-10/products.json?limit=250"
        );

        // Scheme-less and http URLs compose the same HTTPS request
        assert_eq!(
            products_url("test-shopify.myshopify.com", "2023-10"),
            products_url("http://test-shopify.myshopify.com/", "2023-10")
        );
    }

    #[test]
    fn test_orders_url_carries_window_and_page_limit() {
        let url = orders_url(
            "test-shopify.myshopify.com",
            "2023-10",
            "2025-01-01T00:00:00Z",
        );
        assert_eq!(
            url,
            "https://test-shopify.myshopify.com/admin/api/2023-10/orders.json?status=any&created_at_min=2025-01-01T00:00:00Z&limit=250"
        );
    }

    #[test]
    fn test_normalize_product_maps_first_variant() {
        let payload = serde_json::json!({
            "id": 1001,
            "title": "Shopify Product 1",
            "variants": [{"sku": "SP1", "price": "10.00"}],
            "image": {"src": "http://example.com/sp1.jpg"},
        });
        let product: ShopifyProduct = serde_json::from_value(payload).expect("parse");
        let normalized = normalize_product(product);

        assert_eq!(normalized.platform_product_id, "1001");
        assert_eq!(normalized.name, "Shopify Product 1");
        assert_eq!(normalized.sku.as_deref(), Some("SP1"));
        assert_eq!(normalized.price, Decimal::new(1000, 2));
        assert_eq!(
            normalized.image_url.as_deref(),
            Some("http://example.com/sp1.jpg")
        );
    }

    #[test]
    fn test_normalize_product_without_variants_uses_sentinels() {
        let payload = serde_json::json!({"id": 7, "title": "Bare"});
        let product: ShopifyProduct = serde_json::from_value(payload).expect("parse");
        let normalized = normalize_product(product);

        assert_eq!(normalized.sku.as_deref(), Some("N/A"));
        assert_eq!(normalized.price, Decimal::ZERO);
        assert_eq!(normalized.image_url, None);
    }

    #[test]
    fn test_normalize_order_concatenates_name_without_trimming() {
        let payload = serde_json::json!({
            "id": 2001,
            "created_at": "2025-01-01T10:00:00Z",
            "financial_status": "paid",
            "total_price": "25.00",
            "customer": {"first_name": "John", "last_name": null},
            "line_items": [],
        });
        let order: ShopifyOrder = serde_json::from_value(payload).expect("parse");
        let normalized = normalize_order(&order);

        // The missing last name leaves a trailing space
        assert_eq!(normalized.customer_name, "John ");
        assert_eq!(normalized.status, "paid");
        assert_eq!(normalized.total_amount, Decimal::new(2500, 2));
    }

    #[test]
    fn test_normalize_order_without_customer() {
        let payload = serde_json::json!({
            "id": 2002,
            "created_at": "2025-01-01T10:00:00Z",
            "financial_status": "pending",
            "total_price": "0.00",
        });
        let order: ShopifyOrder = serde_json::from_value(payload).expect("parse");
        assert_eq!(normalize_order(&order).customer_name, " ");
    }

    #[test]
    fn test_normalize_line_item() {
        let payload = serde_json::json!({
            "id": 3001,
            "name": "Shopify Item 1",
            "quantity": 2,
            "price": "15.00",
        });
        let item: ShopifyLineItem = serde_json::from_value(payload).expect("parse");
        let normalized = normalize_line_item(&item);

        assert_eq!(normalized.line_item_id, "3001");
        assert_eq!(normalized.product_name, "Shopify Item 1");
        assert_eq!(normalized.quantity, 2);
        assert_eq!(normalized.price, Decimal::new(1500, 2));
    }
}
