//! Platform adapters.
//!
//! Each adapter speaks one upstream REST dialect and translates its payloads
//! into the shared normalized records before they reach the repositories.
//! Dispatch between adapters is a `match` on the store's [`shopsync_core::Platform`]
//! tag in the orchestrator.
//!
//! # Failure policy
//!
//! Adapters absorb their own failures: every error inside a sync operation is
//! caught at the operation boundary, logged with the store's identity, and
//! swallowed. This is the second line of defense behind the orchestrator's
//! per-store isolation - nothing an adapter does may escape past its store.

pub mod shopify;
pub mod woocommerce;

pub use shopify::ShopifySyncer;
pub use woocommerce::{WooClient, WooSyncer};

use rust_decimal::Decimal;
use serde::Deserialize;

/// A money field as the platforms actually send it: usually a decimal string,
/// sometimes a bare JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum MoneyField {
    Text(String),
    Number(f64),
}

impl MoneyField {
    /// Decode to a decimal, falling back to zero for anything unparseable.
    pub(crate) fn to_decimal(&self) -> Decimal {
        match self {
            Self::Text(s) => s.trim().parse().unwrap_or(Decimal::ZERO),
            Self::Number(n) => Decimal::try_from(*n).unwrap_or(Decimal::ZERO),
        }
    }
}
