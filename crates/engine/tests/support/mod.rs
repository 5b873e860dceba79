//! Shared fixtures for the sweep integration tests: an in-memory database
//! and a local HTTP server standing in for a WooCommerce upstream.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use shopsync_core::{Platform, UserId};
use shopsync_engine::db::{self, NewStore, Store, StoreRepository};
use shopsync_engine::{DbLogSink, LogSink, SyncConfig, SyncService};

/// In-memory database with the schema applied. A single connection keeps the
/// database alive for the pool's lifetime.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid connection string")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations apply");
    pool
}

/// A service wired to the pool with a database-backed log sink.
pub fn service(pool: &SqlitePool) -> SyncService {
    let sink: Arc<dyn LogSink> = Arc::new(DbLogSink::new(pool.clone()));
    SyncService::new(
        &SyncConfig::with_database_url("sqlite::memory:"),
        pool.clone(),
        sink,
    )
    .expect("sync service")
}

/// Mutable state of the fake WooCommerce upstream.
pub struct Upstream {
    /// JSON array served from `GET /wp-json/wc/v3/products`.
    pub products: Mutex<serde_json::Value>,
    /// JSON array served from `GET /wp-json/wc/v3/orders`.
    pub orders: Mutex<serde_json::Value>,
    /// Status code for the products endpoint (orders always succeed).
    pub products_status: AtomicU16,
    /// Total requests received on either endpoint.
    pub hits: AtomicUsize,
    /// Raw query string of the most recent orders request.
    pub last_orders_query: Mutex<Option<String>>,
}

impl Upstream {
    pub fn new(products: serde_json::Value, orders: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            products: Mutex::new(products),
            orders: Mutex::new(orders),
            products_status: AtomicU16::new(200),
            hits: AtomicUsize::new(0),
            last_orders_query: Mutex::new(None),
        })
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn set_products(&self, products: serde_json::Value) {
        *self.products.lock().expect("lock") = products;
    }

    pub fn fail_products_with(&self, status: u16) {
        self.products_status.store(status, Ordering::SeqCst);
    }

    pub fn orders_query(&self) -> Option<String> {
        self.last_orders_query.lock().expect("lock").clone()
    }
}

async fn products_handler(State(state): State<Arc<Upstream>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let status = state.products_status.load(Ordering::SeqCst);
    if status != 200 {
        let code = StatusCode::from_u16(status).expect("valid status");
        return (code, Json(serde_json::json!({"message": "upstream failure"})))
            .into_response();
    }
    Json(state.products.lock().expect("lock").clone()).into_response()
}

async fn orders_handler(
    State(state): State<Arc<Upstream>>,
    RawQuery(query): RawQuery,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_orders_query.lock().expect("lock") = query;
    Json(state.orders.lock().expect("lock").clone()).into_response()
}

/// Serve the fake upstream on an ephemeral local port; returns its base URL.
pub async fn spawn_upstream(state: Arc<Upstream>) -> String {
    let app = Router::new()
        .route("/wp-json/wc/v3/products", get(products_handler))
        .route("/wp-json/wc/v3/orders", get(orders_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve upstream");
    });

    format!("http://{addr}")
}

/// An ephemeral port with nothing listening on it.
pub async fn dead_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

pub async fn create_woo_store(pool: &SqlitePool, name: &str, base_url: &str) -> Store {
    StoreRepository::new(pool)
        .create(&NewStore {
            user_id: UserId::new(1),
            name: name.to_owned(),
            platform: Platform::Woocommerce,
            store_url: base_url.to_owned(),
            api_key: Some("ck_test".to_owned()),
            api_secret: Some("cs_test".to_owned()),
            access_token: None,
        })
        .await
        .expect("create woo store")
}

pub async fn create_woo_store_without_credentials(
    pool: &SqlitePool,
    name: &str,
    base_url: &str,
) -> Store {
    StoreRepository::new(pool)
        .create(&NewStore {
            user_id: UserId::new(1),
            name: name.to_owned(),
            platform: Platform::Woocommerce,
            store_url: base_url.to_owned(),
            api_key: None,
            api_secret: None,
            access_token: None,
        })
        .await
        .expect("create woo store")
}

pub async fn create_shopify_store(pool: &SqlitePool, name: &str, store_url: &str) -> Store {
    StoreRepository::new(pool)
        .create(&NewStore {
            user_id: UserId::new(1),
            name: name.to_owned(),
            platform: Platform::Shopify,
            store_url: store_url.to_owned(),
            api_key: None,
            api_secret: None,
            access_token: Some("shpat_test_token".to_owned()),
        })
        .await
        .expect("create shopify store")
}

/// Canned WooCommerce payloads: one product, one order with two line items.
pub fn woo_products_payload() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 1002,
            "name": "WooCommerce Product 1",
            "sku": "WP1",
            "price": "20.00",
            "images": [{"src": "http://example.com/wp1.jpg"}],
        },
    ])
}

pub fn woo_orders_payload() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 2002,
            "date_created": "2025-01-02T11:00:00",
            "status": "processing",
            "total": "50.00",
            "billing": {"first_name": "Jane", "last_name": "Doe"},
            "line_items": [
                {"id": 3003, "name": "WooCommerce Item 1", "quantity": 2, "price": 15.0},
                {"id": 3004, "name": "WooCommerce Item 2", "quantity": 1, "price": 20.0},
            ],
        },
    ])
}
