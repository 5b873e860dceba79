//! Normalized records produced by the platform adapters.
//!
//! Both adapters translate their platform's REST payloads into these shared
//! shapes before anything touches the database. Platform-native identifiers
//! are kept as strings: they are assigned upstream and are only unique within
//! one store, never globally.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog entry as it will be mirrored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    /// Platform-assigned product id (unique per store only).
    pub platform_product_id: String,
    pub name: String,
    /// SKU of the first variant; adapters substitute `"N/A"` when absent.
    pub sku: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// An order header as it will be mirrored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedOrder {
    /// Platform-assigned order id (unique per store only).
    pub platform_order_id: String,
    /// Display name derived from the platform's first/last name fields.
    pub customer_name: String,
    /// Platform-native creation timestamp, stored verbatim.
    pub order_date: String,
    /// Platform-native status string; deliberately not normalized.
    pub status: String,
    pub total_amount: Decimal,
}

/// An order line as it will be mirrored locally.
///
/// The uniqueness key within an order is the platform's *line-item* id, not a
/// product id; the field is named accordingly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLineItem {
    /// Platform-assigned line-item id (unique per order).
    pub line_item_id: String,
    /// Product name snapshot at order time; not a reference into the catalog.
    pub product_name: String,
    pub quantity: i64,
    pub price: Decimal,
}
