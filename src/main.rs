//! chatlog webhook service.
//!
//! Main entry point. Loads configuration, opens the store, and serves the
//! webhook and read endpoints until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use chatlog_api::{AppState, Config};
use chatlog_core::{Clock, RealClock, Storage};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments set the environment.
    let dotenv = dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(&config.rust_log)?;

    info!("Starting chatlog webhook service");
    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let addr = config.parse_server_addr()?;
    info!(
        database_url = %config.database_url,
        channel_secret = %config.channel_secret_masked(),
        access_token = %config.channel_access_token_masked(),
        api_base_url = %config.api_base_url,
        server_addr = %addr,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
    let storage = Storage::connect(&config.database_url, &config.to_storage_options(), &clock)
        .await
        .context("Failed to open database")?;

    let state = AppState::from_config(&config, storage, clock)?;
    let storage = state.storage.clone();

    info!(addr = %addr, "chatlog is ready to receive webhooks");
    chatlog_api::start_server(state, addr).await.context("HTTP server failed")?;

    storage.close().await;
    info!("Database connections closed");

    info!("chatlog shutdown complete");
    Ok(())
}

/// Initializes tracing with the configured log filter.
fn init_tracing(directives: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(directives)
        .or_else(|_| EnvFilter::try_new("info,chatlog=debug,tower_http=debug"))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
    Ok(())
}
