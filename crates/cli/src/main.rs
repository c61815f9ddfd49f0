//! Sudanese Bazaar CLI - shop the bazaar from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! bazaar catalog categories
//! bazaar catalog products --search jalabiya --limit 10
//!
//! # Sign in (password from BAZAAR_PASSWORD or --password)
//! bazaar login -e amna@example.sd
//!
//! # Shop
//! bazaar cart add 3f2a... --quantity 2 --size M
//! bazaar address add --label Home --name "Amna Osman" --phone "+965 5000 0000" \
//!     --area Salmiya --block 4 --street 12 --building 7 --default
//! bazaar checkout
//! bazaar orders list
//! ```
//!
//! # Commands
//!
//! - `catalog` - Browse categories and products
//! - `login` / `register` / `logout` / `whoami` - Session management
//! - `cart` / `wishlist` / `address` - Manage the local store
//! - `checkout` - Place an order for the whole cart
//! - `orders` - Order history and tracking
//! - `sync` - Pull every collection from the server
//! - `language` - Switch display language
//!
//! State is restored from `BAZAAR_STATE_PATH` on start. Background writes are
//! settled and state is saved before the process exits.

#![cfg_attr(not(test), forbid(unsafe_code))]

use bazaar_client::{Bazaar, ClientConfig};
use bazaar_core::Language;
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Sudanese Bazaar shopping client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse categories and products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the local session
    Logout,
    /// Refresh and show the signed-in user
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Manage delivery addresses
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        /// Delivery address id (default address when omitted)
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Order history and tracking
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Pull cart, wishlist, addresses and orders from the server
    Sync,
    /// Switch display language (`ar` or `en`)
    Language { language: Language },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List categories
    Categories,
    /// List products
    Products {
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show one product
    Product { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product
    Add {
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[arg(short, long)]
        size: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove a product (every variant, unless size or color is given)
    Remove {
        product_id: String,

        #[arg(short, long)]
        size: Option<String>,

        #[arg(short, long)]
        color: Option<String>,
    },
    /// Set a product's quantity (0 removes it)
    Update {
        product_id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List wishlisted products
    Show,
    /// Add or remove a product
    Toggle { product_id: String },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add(commands::address::AddressArgs),
    /// Make an address the default
    Default { id: String },
    /// Delete an address
    Remove { id: String },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, most recent first
    List,
    /// Show one order with its delivery progress
    Show { id: String },
    /// Re-fetch orders from the server
    Refresh,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels to Sentry: errors and warnings become events, the rest
/// breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_client=info,bazaar_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut bazaar = Bazaar::from_config(config)?;

    let outcome = dispatch(&mut bazaar, cli.command).await;

    // Save whatever succeeded, even when the command itself failed
    bazaar.settle().await;
    bazaar.persist()?;

    outcome.map_err(|e| {
        e.report();
        e.user_message(bazaar.language()).into()
    })
}

async fn dispatch(bazaar: &mut Bazaar, command: Commands) -> bazaar_client::Result<()> {
    match command {
        Commands::Catalog { action } => match action {
            CatalogAction::Categories => commands::catalog::categories(bazaar).await,
            CatalogAction::Products {
                category,
                search,
                limit,
            } => commands::catalog::products(bazaar, category, search, limit).await,
            CatalogAction::Product { id } => commands::catalog::product(bazaar, &id).await,
        },
        Commands::Login { email, password } => {
            commands::account::login(bazaar, &email, password).await
        }
        Commands::Register {
            name,
            email,
            phone,
            password,
        } => commands::account::register(bazaar, name, email, phone, password).await,
        Commands::Logout => {
            bazaar.logout().await;
            Ok(())
        }
        Commands::Whoami => commands::account::whoami(bazaar).await,
        Commands::Cart { action } => match action {
            CartAction::Show => {
                commands::cart::show(bazaar);
                Ok(())
            }
            CartAction::Add {
                product_id,
                quantity,
                size,
                color,
            } => commands::cart::add(bazaar, &product_id, quantity, size, color).await,
            CartAction::Remove {
                product_id,
                size,
                color,
            } => {
                commands::cart::remove(bazaar, &product_id, size, color);
                Ok(())
            }
            CartAction::Update {
                product_id,
                quantity,
            } => {
                commands::cart::update(bazaar, &product_id, quantity);
                Ok(())
            }
            CartAction::Clear => {
                bazaar.clear_cart();
                tracing::info!("Cart cleared");
                Ok(())
            }
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => {
                commands::cart::show_wishlist(bazaar);
                Ok(())
            }
            WishlistAction::Toggle { product_id } => {
                commands::cart::toggle_wishlist(bazaar, &product_id);
                Ok(())
            }
        },
        Commands::Address { action } => match action {
            AddressAction::List => {
                commands::address::list(bazaar);
                Ok(())
            }
            AddressAction::Add(args) => {
                commands::address::add(bazaar, args);
                Ok(())
            }
            AddressAction::Default { id } => commands::address::set_default(bazaar, &id),
            AddressAction::Remove { id } => commands::address::remove(bazaar, &id).await,
        },
        Commands::Checkout { address } => commands::orders::checkout(bazaar, address).await,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(bazaar).await,
            OrdersAction::Show { id } => commands::orders::show(bazaar, &id).await,
            OrdersAction::Refresh => {
                bazaar.sync_orders().await?;
                commands::orders::print_orders(bazaar);
                Ok(())
            }
        },
        Commands::Sync => {
            commands::account::sync(bazaar).await;
            Ok(())
        }
        Commands::Language { language } => {
            bazaar.set_language(language);
            tracing::info!("Language set to {language}");
            Ok(())
        }
    }
}
