//! Shopsync CLI - migrations, sync sweeps, and store management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shopsync migrate
//!
//! # Synchronize products and orders for all active stores
//! shopsync sync all
//!
//! # Synchronize one entity, or one store
//! shopsync sync products
//! shopsync sync orders
//! shopsync sync store 3
//!
//! # Manage stores
//! shopsync store add -n "My Shop" -p shopify -u my-shop.myshopify.com --access-token shpat_...
//! shopsync store list
//! shopsync store remove 3
//!
//! # Inspect sync logs
//! shopsync logs --level error --store 3
//! ```
//!
//! Sweeps always exit zero: per-store failures are absorbed by the engine
//! and visible only through `shopsync logs`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopsync")]
#[command(author, version, about = "Shopsync CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Run synchronization sweeps
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
    /// Manage registered stores
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Show recent sync log entries
    Logs {
        /// Filter by level (info, warning, error)
        #[arg(short, long)]
        level: Option<String>,

        /// Filter by store id
        #[arg(short, long)]
        store: Option<i64>,

        /// Maximum number of entries
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum SyncTarget {
    /// Products then orders, for all active stores
    All,
    /// Products only
    Products,
    /// Orders only
    Orders,
    /// Products and orders for a single store
    Store {
        /// Store id
        id: i64,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Register a new store
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Platform (shopify or woocommerce)
        #[arg(short, long)]
        platform: String,

        /// Store URL (domain for Shopify, full base URL for WooCommerce)
        #[arg(short, long)]
        url: String,

        /// Owning user id
        #[arg(long, default_value_t = 1)]
        user: i64,

        /// WooCommerce consumer key
        #[arg(long)]
        api_key: Option<String>,

        /// WooCommerce consumer secret
        #[arg(long)]
        api_secret: Option<String>,

        /// Shopify Admin API access token
        #[arg(long)]
        access_token: Option<String>,
    },
    /// List stores
    List {
        /// Include soft-deleted stores
        #[arg(long)]
        all: bool,
    },
    /// Soft-delete a store (it is retained for audit)
    Remove {
        /// Store id
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync { target } => match target {
            SyncTarget::All => commands::sync::all().await?,
            SyncTarget::Products => commands::sync::products().await?,
            SyncTarget::Orders => commands::sync::orders().await?,
            SyncTarget::Store { id } => commands::sync::store(id).await?,
        },
        Commands::Store { action } => match action {
            StoreAction::Add {
                name,
                platform,
                url,
                user,
                api_key,
                api_secret,
                access_token,
            } => {
                commands::store::add(
                    &name,
                    &platform,
                    &url,
                    user,
                    api_key,
                    api_secret,
                    access_token,
                )
                .await?;
            }
            StoreAction::List { all } => commands::store::list(all).await?,
            StoreAction::Remove { id } => commands::store::remove(id).await?,
        },
        Commands::Logs {
            level,
            store,
            limit,
        } => commands::logs::show(level.as_deref(), store, limit).await?,
    }
    Ok(())
}
