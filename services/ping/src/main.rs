//! Ping Service
//!
//! Serves `GET /` with "Ping!" and `GET /send-ping`, which forwards to
//! pong-service through service discovery.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ping_service::{AppState, PONG_SERVICE};
use pingpong_mesh::{telemetry, Dispatcher, MeshConfig, ServiceHost, ServiceName};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the service config file
    #[arg(long, env = "SERVICE_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Override the configured listen port
    #[arg(long, env = "SERVICE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let cli = Cli::parse();

    let mut config = MeshConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }

    let pong = ServiceName::parse(PONG_SERVICE)?;
    config
        .apply_env_overrides(std::slice::from_ref(&pong))
        .context("Invalid discovery override")?;
    if !config.discovery.services.contains_key(&pong) {
        warn!(
            "No address for {} (set discovery.services or {}); /send-ping will fail",
            pong,
            pong.env_key()
        );
    }

    info!("Starting {}", config.service.name);

    let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
    let state = AppState::new(dispatcher, config.service.name.clone());

    ServiceHost::new(config)
        .with_version(env!("CARGO_PKG_VERSION"))
        .register_routes([("", ping_service::router(state))])
        .serve()
        .await
}
