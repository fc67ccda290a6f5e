use intent_wallet::{api::Server, config::Config, host::InMemoryHost};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Used when `INTENT_WALLET_CONFIG` is not set
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// The main entry point for the relayer node.
///
/// This function initializes logging, loads the configuration, bootstraps
/// the engine with the configured owner and whitelists, and serves the
/// JSON-RPC API.
///
/// # Returns
/// An error if the configuration cannot be loaded, the owner is invalid,
/// or the server fails to bind
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging. `RUST_LOG` overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load the configuration from the TOML file
    let path = std::env::var("INTENT_WALLET_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&path)?;
    info!("Relayer node starting with config: {:?}", config);

    // Build the engine; the configured whitelists are applied by the owner
    let engine = Arc::new(config.build_engine()?);
    info!(
        "Engine domain {} v{} on chain {} at {:?}, owner {:?}",
        engine.domain().name,
        engine.domain().version,
        engine.domain().chain_id,
        engine.domain().verifying_contract,
        engine.owner()
    );

    // Submissions are made under the node relayer, which must be whitelisted
    if !engine.is_relayer_allowed(&config.relayer.address) {
        warn!(
            "Node relayer {:?} is not whitelisted; every submission will be rejected",
            config.relayer.address
        );
    }

    // Serve until shutdown
    let server = Server::new(config, engine, InMemoryHost::new());
    server.start().await?;

    Ok(())
}
