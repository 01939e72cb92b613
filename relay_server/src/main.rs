//! Relay server entry point
//!
//! Parses configuration, installs logging, and serves until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use relay_server::{Config, RelayServer, telemetry};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    telemetry::init(config.log_format)?;

    info!(version = env!("CARGO_PKG_VERSION"), "relay server starting");

    let server = RelayServer::bind(&config)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    server.run(shutdown).await?;
    Ok(())
}
