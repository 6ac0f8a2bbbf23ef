//! position-relay server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay endpoint.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use position_relay::config::RelayConfig;
use position_relay::{build_app, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env().context("loading configuration")?;
    tracing::info!(
        addr = %config.listen_addr,
        outbound_buffer = config.outbound_buffer,
        idle_timeout_secs = config.idle_timeout_secs,
        "starting position-relay"
    );

    let app = build_app(build_state(&config));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("serving")?;

    Ok(())
}
