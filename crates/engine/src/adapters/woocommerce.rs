//! WooCommerce platform adapter.
//!
//! WooCommerce's REST API (`wc/v3`) authenticates with a consumer key and
//! secret rather than a bearer token, so requests go through a small
//! [`WooClient`] built per store. Missing credentials are a precondition
//! failure detected strictly before any network call: the client refuses to
//! construct and both sync operations are skipped for that store.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use thiserror::Error;
use url::Url;

use shopsync_core::{LogEntry, NormalizedLineItem, NormalizedOrder, NormalizedProduct};

use super::MoneyField;
use crate::db::{OrderRepository, ProductRepository, RepositoryError, Store};
use crate::logging::LogSink;

/// API namespace under the store's base URL.
const API_NAMESPACE: &str = "wp-json/wc/v3";

/// WooCommerce's order page cap (smaller than Shopify's 250).
const ORDERS_PAGE_SIZE: u32 = 100;

/// Errors from the WooCommerce client or a fetch-and-upsert attempt.
#[derive(Debug, Error)]
pub enum WooError {
    /// Store is missing its URL, consumer key, or consumer secret.
    #[error("WooCommerce credentials missing")]
    MissingCredentials,

    /// Store URL is present but not a valid absolute URL.
    #[error("invalid store URL: {0}")]
    InvalidBaseUrl(String),

    /// HTTP transport or body-decode failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Local persistence failure.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Minimal REST client for one WooCommerce store.
#[derive(Clone)]
pub struct WooClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: SecretString,
    consumer_secret: SecretString,
}

impl WooClient {
    /// Build a client from a store's connection descriptor.
    ///
    /// # Errors
    ///
    /// Returns `WooError::MissingCredentials` if the URL, key, or secret is
    /// absent, or `WooError::InvalidBaseUrl` if the URL does not parse. No
    /// network traffic happens here.
    pub fn from_store(http: reqwest::Client, store: &Store) -> Result<Self, WooError> {
        let (Some(key), Some(secret)) = (&store.api_key, &store.api_secret) else {
            return Err(WooError::MissingCredentials);
        };
        if store.store_url.is_empty() {
            return Err(WooError::MissingCredentials);
        }
        Url::parse(&store.store_url)
            .map_err(|e| WooError::InvalidBaseUrl(e.to_string()))?;

        Ok(Self {
            http,
            base_url: store.store_url.trim_end_matches('/').to_owned(),
            consumer_key: key.clone(),
            consumer_secret: secret.clone(),
        })
    }

    /// GET an endpoint under `wc/v3` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `WooError::Api` for non-success responses (with the response
    /// body) and `WooError::Http` for transport or decode failures.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, WooError> {
        let url = format!("{}/{API_NAMESPACE}/{endpoint}", self.base_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(
                self.consumer_key.expose_secret(),
                Some(self.consumer_secret.expose_secret()),
            )
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WooError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Syncer for WooCommerce stores.
pub struct WooSyncer {
    http: reqwest::Client,
    pool: SqlitePool,
    sink: Arc<dyn LogSink>,
    lookback_days: i64,
}

impl WooSyncer {
    /// Create a syncer.
    pub fn new(
        http: reqwest::Client,
        pool: SqlitePool,
        sink: Arc<dyn LogSink>,
        lookback_days: i64,
    ) -> Self {
        Self {
            http,
            pool,
            sink,
            lookback_days,
        }
    }

    /// Mirror the store's catalog. Never returns an error; failures are
    /// logged against the store and swallowed.
    pub async fn sync_products(&self, store: &Store) {
        let Some(client) = self.client_for(store).await else {
            return;
        };
        if let Err(err) = self.try_sync_products(store, &client).await {
            self.sink
                .write(
                    LogEntry::error(format!(
                        "WooCommerce product sync error for store {}: {err}",
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
        let Some(client) = self.client_for(store).await else {
            return;
        };
        if let Err(err) = self.try_sync_orders(store, &client).await {
            self.sink
                .write(
                    LogEntry::error(format!(
                        "WooCommerce order sync error for store {}: {err}",
                        store.name
                    ))
                    .store(store.id),
                )
                .await;
        }
    }

    /// Construct the per-store client, logging and returning `None` when the
    /// precondition fails.
    async fn client_for(&self, store: &Store) -> Option<WooClient> {
        match WooClient::from_store(self.http.clone(), store) {
            Ok(client) => Some(client),
            Err(WooError::MissingCredentials) => {
                self.sink
                    .write(
                        LogEntry::error(format!(
                            "WooCommerce credentials missing for store: {}",
                            store.name
                        ))
                        .store(store.id),
                    )
                    .await;
                None
            }
            Err(err) => {
                self.sink
                    .write(
                        LogEntry::error(format!(
                            "Could not initialize WooCommerce client for store {}: {err}",
                            store.name
                        ))
                        .store(store.id),
                    )
                    .await;
                None
            }
        }
    }

    async fn try_sync_products(
        &self,
        store: &Store,
        client: &WooClient,
    ) -> Result<(), WooError> {
        let products: Vec<WooProduct> = client.get("products", &[]).await?;

        let repo = ProductRepository::new(&self.pool);
        for product in products {
            repo.upsert(store.id, &normalize_product(product)).await?;
        }

        self.sink
            .write(
                LogEntry::info(format!(
                    "WooCommerce products synchronized successfully for store: {}",
                    store.name
                ))
                .store(store.id),
            )
            .await;
        Ok(())
    }

    async fn try_sync_orders(&self, store: &Store, client: &WooClient) -> Result<(), WooError> {
        let orders: Vec<WooOrder> = client
            .get("orders", &orders_query(self.lookback_days))
            .await?;

        let repo = OrderRepository::new(&self.pool);
        for order in orders {
            let order_id = repo.upsert_order(store.id, &normalize_order(&order)).await?;
            for item in &order.line_items {
                repo.upsert_item(order_id, &normalize_line_item(item)).await?;
            }
        }

        self.sink
            .write(
                LogEntry::info(format!(
                    "WooCommerce orders synchronized successfully for store: {}",
                    store.name
                ))
                .store(store.id),
            )
            .await;
        Ok(())
    }
}

/// Query string for the order listing: a lookback window plus the platform's
/// page cap.
fn orders_query(lookback_days: i64) -> Vec<(&'static str, String)> {
    let after = (Utc::now() - chrono::Duration::days(lookback_days))
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    vec![
        ("after", after),
        ("per_page", ORDERS_PAGE_SIZE.to_string()),
    ]
}

// =============================================================================
// Upstream payload shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct WooProduct {
    id: i64,
    name: String,
    sku: Option<String>,
    price: Option<MoneyField>,
    #[serde(default)]
    images: Vec<WooImage>,
}

#[derive(Debug, Deserialize)]
struct WooImage {
    src: String,
}

#[derive(Debug, Deserialize)]
struct WooOrder {
    id: i64,
    date_created: String,
    status: String,
    total: MoneyField,
    billing: Option<WooBilling>,
    #[serde(default)]
    line_items: Vec<WooLineItem>,
}

#[derive(Debug, Deserialize)]
struct WooBilling {
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WooLineItem {
    id: i64,
    name: String,
    quantity: i64,
    price: MoneyField,
}

// =============================================================================
// Normalization
// =============================================================================

fn normalize_product(product: WooProduct) -> NormalizedProduct {
    NormalizedProduct {
        platform_product_id: product.id.to_string(),
        name: product.name,
        sku: Some(product.sku.unwrap_or_else(|| "N/A".to_owned())),
        price: product
            .price
            .as_ref()
            .map_or(Decimal::ZERO, MoneyField::to_decimal),
        image_url: product.images.into_iter().next().map(|i| i.src),
    }
}

fn normalize_order(order: &WooOrder) -> NormalizedOrder {
    let first = order
        .billing
        .as_ref()
        .and_then(|b| b.first_name.clone())
        .unwrap_or_default();
    let last = order
        .billing
        .as_ref()
        .and_then(|b| b.last_name.clone())
        .unwrap_or_default();

    NormalizedOrder {
        platform_order_id: order.id.to_string(),
        // Unlike the Shopify path, this one trims the joined name.
        customer_name: format!("{first} {last}").trim().to_owned(),
        order_date: order.date_created.clone(),
        status: order.status.clone(),
        total_amount: order.total.to_decimal(),
    }
}

fn normalize_line_item(item: &WooLineItem) -> NormalizedLineItem {
    NormalizedLineItem {
        line_item_id: item.id.to_string(),
        product_name: item.name.clone(),
        quantity: item.quantity,
        price: item.price.to_decimal(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use shopsync_core::{Platform, StoreId, UserId};

    fn store(
        url: &str,
        api_key: Option<&str>,
        api_secret: Option<&str>,
    ) -> Store {
        let now = Utc::now();
        Store {
            id: StoreId::new(1),
            user_id: UserId::new(1),
            name: "Woo Test".to_owned(),
            platform: Some(Platform::Woocommerce),
            store_url: url.to_owned(),
            api_key: api_key.map(|s| SecretString::from(s.to_owned())),
            api_secret: api_secret.map(|s| SecretString::from(s.to_owned())),
            access_token: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_client_requires_all_credentials() {
        let http = reqwest::Client::new();

        for broken in [
            store("http://woo.example.com", None, Some("cs")),
            store("http://woo.example.com", Some("ck"), None),
            store("", Some("ck"), Some("cs")),
        ] {
            assert!(matches!(
                WooClient::from_store(http.clone(), &broken),
                Err(WooError::MissingCredentials)
            ));
        }

        assert!(
            WooClient::from_store(http, &store("http://woo.example.com", Some("ck"), Some("cs")))
                .is_ok()
        );
    }

    #[test]
    fn test_client_rejects_unparseable_url() {
        let http = reqwest::Client::new();
        assert!(matches!(
            WooClient::from_store(http, &store("not a url", Some("ck"), Some("cs"))),
            Err(WooError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_orders_query_carries_page_cap_and_window() {
        let query = orders_query(30);
        assert!(query.contains(&("per_page", "100".to_owned())));

        let after = query
            .iter()
            .find(|(key, _)| *key == "after")
            .map(|(_, value)| value.clone())
            .expect("after present");
        let parsed = DateTime::parse_from_rfc3339(&after).expect("valid timestamp");
        let days_back = (Utc::now() - parsed.with_timezone(&Utc)).num_days();
        assert_eq!(days_back, 30);
    }

    #[test]
    fn test_normalize_product_defaults() {
        let payload = serde_json::json!({
            "id": 1002,
            "name": "WooCommerce Product 1",
            "sku": null,
            "price": null,
        });
        let product: WooProduct = serde_json::from_value(payload).expect("parse");
        let normalized = normalize_product(product);

        assert_eq!(normalized.platform_product_id, "1002");
        assert_eq!(normalized.sku.as_deref(), Some("N/A"));
        assert_eq!(normalized.price, Decimal::ZERO);
        assert_eq!(normalized.image_url, None);
    }

    #[test]
    fn test_normalize_product_takes_first_image() {
        let payload = serde_json::json!({
            "id": 1002,
            "name": "WooCommerce Product 1",
            "sku": "WP1",
            "price": "20.00",
            "images": [
                {"src": "http://example.com/wp1.jpg"},
                {"src": "http://example.com/wp1-alt.jpg"},
            ],
        });
        let product: WooProduct = serde_json::from_value(payload).expect("parse");
        let normalized = normalize_product(product);

        assert_eq!(normalized.sku.as_deref(), Some("WP1"));
        assert_eq!(normalized.price, Decimal::new(2000, 2));
        assert_eq!(
            normalized.image_url.as_deref(),
            Some("http://example.com/wp1.jpg")
        );
    }

    #[test]
    fn test_normalize_order_trims_customer_name() {
        let payload = serde_json::json!({
            "id": 2002,
            "date_created": "2025-01-02T11:00:00",
            "status": "processing",
            "total": "50.00",
            "billing": {"first_name": "Jane", "last_name": null},
            "line_items": [
                {"id": 3003, "name": "Item", "quantity": 2, "price": 15.0},
            ],
        });
        let order: WooOrder = serde_json::from_value(payload).expect("parse");
        let normalized = normalize_order(&order);

        // The WooCommerce path trims, so no trailing space here
        assert_eq!(normalized.customer_name, "Jane");
        assert_eq!(normalized.status, "processing");
        assert_eq!(normalized.total_amount, Decimal::new(5000, 2));

        let item = order.line_items.first().expect("line item");
        let normalized_item = normalize_line_item(item);
        assert_eq!(normalized_item.line_item_id, "3003");
        assert_eq!(normalized_item.price, Decimal::new(150, 1));
    }
}
