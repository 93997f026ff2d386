//! unilib - university library client

use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reqwest::Url;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unilib_client::{
    api::ApiClient,
    cli::{self, Cli, Commands},
    config::AppConfig,
    services::Services,
    storage::FileStore,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("unilib_client={},unilib={}", config.logging.level, config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Starting unilib v{}", env!("CARGO_PKG_VERSION"));

    let api = Arc::new(ApiClient::new(&config.api)?);
    let storage = Rc::new(FileStore::new(&config.storage.dir));
    let initial_url = args
        .url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("Invalid catalog URL")?;

    let (mut services, mut notifications) =
        Services::new(&config, api, storage, initial_url.as_ref())?;

    let format = args.format;
    let result = match args.command {
        Commands::Books(args) => cli::catalog::books(args, &mut services, format).await,
        Commands::Book(args) => cli::catalog::book(args, &services, format).await,
        Commands::References => cli::catalog::references(&services, format).await,
        Commands::Cart(args) => cli::cart::cart(args, &mut services, format).await,
        Commands::Checkout(args) => cli::cart::checkout(args, &mut services, format).await,
        Commands::Favorite(args) => cli::account::favorite(args, &services).await,
        Commands::Login(args) => cli::account::login(args, &services).await,
        Commands::Logout => cli::account::logout(&services),
        Commands::Me => cli::account::me(&services, format).await,
        Commands::Loans => cli::account::loans(&services, format).await,
    };

    cli::print_notifications(&mut notifications);
    result
}
