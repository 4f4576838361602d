//! Online Shop CLI - Browse, buy, and administer the shop from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password can also come from SHOP_PASSWORD)
//! shop-cli login -u ayse --password 'secret'
//!
//! # Browse the catalog and buy something
//! shop-cli products list
//! shop-cli products show 3 --image-out mug.png
//! shop-cli orders buy 3
//!
//! # Admin views
//! shop-cli orders list
//! shop-cli orders receipt 12 -o receipt.pdf
//! shop-cli customers list
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` / `refresh` / `register` - Session management
//! - `products` - Catalog browsing and admin CRUD
//! - `orders` - Buying, order history, receipts
//! - `customers` - Profiles and user administration
//!
//! Every command hydrates the session first, passes through the access guard
//! for its view, and reports failures through the shared failure view.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use onlineshop_core::{CustomerId, OrderId, ProductId};
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::config::StorefrontConfig;
use onlineshop_storefront::screen::FailureView;
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Online Shop command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "SHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Re-fetch the logged-in user's record
    Refresh,
    /// Create a customer account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "SHOP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Phone number (555-555-5555)
        #[arg(long)]
        phone: String,

        #[arg(long)]
        address: String,
    },
    /// Browse and manage the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Buy and manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// View and manage customer accounts
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List the catalog
    List,
    /// Show one product with its image
    Show {
        id: ProductId,

        /// Write the product image here
        #[arg(long)]
        image_out: Option<PathBuf>,
    },
    /// Add a product (admin)
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        supplier: String,
        #[arg(long)]
        price: Decimal,
        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Update a product (admin)
    Update {
        id: ProductId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        supplier: String,
        #[arg(long)]
        price: Decimal,
        /// Replacement image file
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete a product (admin)
    Delete { id: ProductId },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Orders placed by the logged-in user
    Mine,
    /// Every order in the shop (admin)
    List,
    /// Show one order (admin)
    Show { id: OrderId },
    /// Buy a product
    Buy { product_id: ProductId },
    /// Cancel an order (admin)
    Cancel { id: OrderId },
    /// Download an order's PDF receipt (admin)
    Receipt {
        id: OrderId,

        /// Output file
        #[arg(short, long, default_value = "order_receipt.pdf")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// List every customer (admin)
    List,
    /// Show a customer (defaults to the logged-in user)
    Show {
        id: Option<CustomerId>,

        /// Write the profile picture here
        #[arg(long)]
        image_out: Option<PathBuf>,
    },
    /// Update your own profile
    Update {
        #[arg(long)]
        username: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        /// New profile picture
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete a customer (admin)
    Delete { id: CustomerId },
    /// Create an admin account (admin)
    AddAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
    },
    /// Download the customer list as PDF (admin)
    Report {
        /// Output file
        #[arg(short, long, default_value = "customers_report.pdf")]
        output: PathBuf,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Defaults to info for our crates.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "onlineshop=info,shop_cli=info".into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing();

    let code = match ShopContext::new(config) {
        Ok(context) => match run(&context, cli).await {
            Ok(()) => 0,
            Err(e) => {
                e.report();
                render_failure(&e);
                1
            }
        },
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {e}");
            1
        }
    };

    // Flush pending Sentry events before exiting
    drop(sentry_guard);
    std::process::exit(code);
}

/// Print the shared failure view for an error.
fn render_failure(error: &CliError) {
    let view = FailureView::new(&error.envelope());
    tracing::error!("{}", view.headline);
    if let Some(status_line) = &view.status_line {
        tracing::error!("{status_line}");
    }
    tracing::error!("{}", view.message);
    tracing::info!("Go back: shop-cli products list ({})", view.back_path);
}

async fn run(context: &ShopContext, cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(context, &username, password.into()).await?;
        }
        Commands::Logout => commands::session::logout(context).await,
        Commands::Whoami => commands::session::whoami(context).await?,
        Commands::Refresh => commands::session::refresh(context).await?,
        Commands::Register {
            username,
            password,
            phone,
            address,
        } => {
            commands::session::register(context, username, password.into(), phone, address)
                .await?;
        }
        Commands::Products { action } => match action {
            ProductAction::List => commands::products::list(context).await?,
            ProductAction::Show { id, image_out } => {
                commands::products::show(context, id, image_out.as_deref()).await?;
            }
            ProductAction::Add {
                name,
                supplier,
                price,
                image,
            } => {
                let form = commands::products::ProductForm {
                    name,
                    supplier,
                    price,
                    image,
                };
                commands::products::add(context, form).await?;
            }
            ProductAction::Update {
                id,
                name,
                supplier,
                price,
                image,
            } => {
                let form = commands::products::ProductForm {
                    name,
                    supplier,
                    price,
                    image,
                };
                commands::products::update(context, id, form).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(context, id).await?,
        },
        Commands::Orders { action } => match action {
            OrderAction::Mine => commands::orders::mine(context).await?,
            OrderAction::List => commands::orders::list(context).await?,
            OrderAction::Show { id } => commands::orders::show(context, id).await?,
            OrderAction::Buy { product_id } => commands::orders::buy(context, product_id).await?,
            OrderAction::Cancel { id } => commands::orders::cancel(context, id).await?,
            OrderAction::Receipt { id, output } => {
                commands::orders::receipt(context, id, &output).await?;
            }
        },
        Commands::Customers { action } => match action {
            CustomerAction::List => commands::customers::list(context).await?,
            CustomerAction::Show { id, image_out } => {
                commands::customers::show(context, id, image_out.as_deref()).await?;
            }
            CustomerAction::Update {
                username,
                phone,
                address,
                image,
            } => {
                commands::customers::update_profile(context, username, phone, address, image)
                    .await?;
            }
            CustomerAction::Delete { id } => commands::customers::delete(context, id).await?,
            CustomerAction::AddAdmin {
                username,
                phone,
                address,
            } => commands::customers::add_admin(context, username, phone, address).await?,
            CustomerAction::Report { output } => {
                commands::customers::report(context, &output).await?;
            }
        },
    }
    Ok(())
}
