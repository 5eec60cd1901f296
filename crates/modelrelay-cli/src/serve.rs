//! `modelrelay serve` — start the HTTP gateway.
//!
//! Startup sequence:
//! 1. Load config, apply `--host` / `--port`
//! 2. Build the provider registry and transports
//! 3. Resolve the listen address
//! 4. Serve until Ctrl+C

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use modelrelay_core::config::load_config;
use modelrelay_gateway::GatewayServer;
use modelrelay_router::Router;

use crate::helpers;

/// Run the gateway.
pub async fn run(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    helpers::print_banner();
    println!("  Mode: Gateway");

    // 1. Load config
    let mut config = load_config(config_path);
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    // 2. Router (registry + transports)
    let router = Router::from_config(&config).context("failed to build provider transports")?;

    println!();
    for status in router.registry().status() {
        println!(
            "  {:<12} {}",
            status.name,
            helpers::availability_mark(status.configured, status.available)
        );
    }
    println!();

    // 3. Listen address
    let server = &config.server;
    let bind = tokio::net::lookup_host((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("failed to resolve {}:{}", server.host, server.port))?
        .next()
        .with_context(|| format!("no address for {}:{}", server.host, server.port))?;

    println!(
        "  {} http://{}",
        "Listening on".bold(),
        bind.to_string().cyan()
    );
    println!("  {}", "Press Ctrl+C to stop.".dimmed());
    println!();

    // 4. Serve
    info!(%bind, origins = ?server.cors_origins, "Starting gateway");
    GatewayServer::new(Arc::new(router), bind, server.cors_origins.clone())
        .run()
        .await
}
