//! Pong Service
//!
//! Serves `GET /` with "Pong!".

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pingpong_mesh::{telemetry, MeshConfig, ServiceHost};
use tracing::info;

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
    config
        .apply_env_overrides(&[])
        .context("Invalid discovery override")?;

    info!("Starting {}", config.service.name);

    ServiceHost::new(config)
        .with_version(env!("CARGO_PKG_VERSION"))
        .register_routes([("", pong_service::router())])
        .serve()
        .await
}
