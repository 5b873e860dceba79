//! Shopsync Engine - the synchronization core.
//!
//! Pulls products and orders from every connected store's platform API and
//! mirrors them into a local SQLite database for unified querying. Upstream
//! is the source of truth: local rows are always overwritten from it, and
//! rows that disappear upstream are deliberately left in place.
//!
//! # Architecture
//!
//! - [`sync::SyncService`] - orchestrator: sweeps the store registry and
//!   dispatches each store to its adapter inside a per-store error boundary
//! - [`adapters`] - Shopify and WooCommerce REST dialects, normalized into
//!   shared record shapes
//! - [`db`] - SQLite pool, embedded migrations, and the keyed upsert
//!   repositories
//! - [`logging`] - structured event sink backed by the `logs` table
//! - [`config`] - explicit engine configuration from the environment
//!
//! Failures never propagate across stores: a sweep always runs to the end,
//! and partial failure is visible only in the persisted logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod adapters;
pub mod config;
pub mod db;
pub mod logging;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use logging::{DbLogSink, LogSink};
pub use sync::{SyncError, SyncService};
