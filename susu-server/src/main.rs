//! Susu Pool Server
//!
//! A headless rotating-savings engine: pools, cyclical contributions,
//! rotation payouts, and hub graduation over an escrow ledger.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use config::file::HubConfig;
use kanau::processor::Processor;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use susu_core::engine::{RegisterHub, SusuEngine};
use susu_core::errors::EngineError;
use susu_core::events::{EventSenders, PoolEventReceiver, pool_event_channel};
use susu_core::framework::{EntropySeedProvider, InMemoryLedger, SystemClock};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Susu - rotating savings pool engine
#[derive(Parser, Debug)]
#[command(name = "susu-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./susu-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting susu-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Engine limits and the hub seed list are consumed at construction;
    // the rest becomes shared config with separate locks per section.
    let engine_config = loaded_config.engine.clone();
    let hubs = loaded_config.hubs.clone();
    let shared_config = loaded_config.into_shared();

    // Assemble the engine over an in-memory escrow ledger.
    let (event_tx, event_rx) = pool_event_channel();
    let engine = SusuEngine::new(
        engine_config,
        Arc::new(InMemoryLedger::new()),
        Arc::new(EntropySeedProvider),
        Arc::new(SystemClock),
        EventSenders::new(event_tx),
    );

    // Drain pool events into the log.
    tokio::spawn(log_pool_events(event_rx));

    // Register hubs from configuration
    seed_hubs(&engine, &hubs).await.map_err(|e| {
        tracing::error!("Failed to register configured hubs: {}", e);
        e
    })?;

    // Create application state
    let state = AppState::new(engine, shared_config);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Register the `[[hubs]]` config sections with the engine.
///
/// Registration is idempotent on the hub id, so startup and SIGHUP reload
/// can both replay the full list.
pub(crate) async fn seed_hubs(
    engine: &SusuEngine,
    hubs: &[HubConfig],
) -> Result<(), EngineError> {
    for hub in hubs {
        let record = engine
            .process(RegisterHub {
                hub_id: hub.hub_id.clone(),
                name: hub.name.clone(),
                kind: hub.kind.into(),
                description: hub.description.clone(),
            })
            .await?;
        tracing::info!(hub_id = %record.hub_id, "Hub registered");
    }
    Ok(())
}

/// Drain engine events into structured logs.
///
/// Webhook or indexer consumers would subscribe here; the server itself
/// only logs them.
async fn log_pool_events(mut events: PoolEventReceiver) {
    while let Some(event) = events.recv().await {
        tracing::info!(pool_id = %event.pool_id(), event = ?event, "Pool event");
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
