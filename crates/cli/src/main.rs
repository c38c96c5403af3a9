//! RocketShoes CLI - Command-line front end for the cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rs-cart show
//!
//! # Add one unit of product 1
//! rs-cart add 1
//!
//! # Set product 1 to 3 units (checked against stock)
//! rs-cart set 1 3
//!
//! # Remove product 1
//! rs-cart remove 1
//! ```
//!
//! # Environment Variables
//!
//! - `CART_API_URL` - Catalog API base URL (default: `http://localhost:3333`)
//! - `CART_STORAGE_PATH` - Cart file (default: `.rocketshoes/cart.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `RUST_LOG` - Log filter (default: `rocketshoes_storefront=info,rs_cart=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use rocketshoes_storefront::{CartConfig, FileCartStore};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::cart::CartCommand;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "RocketShoes cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Set {
        /// Product ID
        product_id: ProductId,

        /// New quantity (checked against stock; values below 1 are ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

impl From<Commands> for CartCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Show => Self::Show,
            Commands::Add { product_id } => Self::Add(product_id),
            Commands::Remove { product_id } => Self::Remove(product_id),
            Commands::Set { product_id, amount } => Self::SetQuantity(product_id, amount),
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_storefront=info,rs_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing();

    let code = match run(cli, &config).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            2
        }
    };

    // Flush pending Sentry events; process::exit skips destructors
    drop(sentry_guard);
    if code != 0 {
        std::process::exit(code);
    }
}

/// Run the command. Returns `Ok(false)` if any notice was shown.
async fn run(cli: Cli, config: &CartConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let store = FileCartStore::from_config(config)?;
    let report = commands::cart::run(&store, cli.command.into()).await;

    #[allow(clippy::print_stderr)]
    {
        for notice in &report.notices {
            eprintln!("error: {notice}");
        }
    }

    #[allow(clippy::print_stdout)]
    {
        print!("{}", commands::cart::render(&report.cart));
    }

    Ok(report.notices.is_empty())
}
