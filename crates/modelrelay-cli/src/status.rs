//! `modelrelay status` — show configuration and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use modelrelay_core::config::{get_config_path, load_config};
use modelrelay_core::utils::redact_key;
use modelrelay_providers::registry::ProviderRegistry;

use crate::helpers;

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "⚡ Modelrelay Status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Server
    println!(
        "  {:<18} {}:{}",
        "Server:".bold(),
        config.server.host,
        config.server.port
    );
    println!(
        "  {:<18} {}",
        "CORS origins:".bold(),
        config.server.cors_origins.join(", ").dimmed()
    );

    // Routing parameters
    let routing = &config.routing;
    println!(
        "  {:<18} {} | chat: {} | code: {} | timeout: {}s",
        "Parameters:".bold(),
        format!("temp: {}", routing.temperature).dimmed(),
        routing.chat_max_tokens,
        routing.code_max_tokens,
        routing.timeout_secs,
    );

    // Providers, in auto-mode precedence
    println!();
    println!("  {}", "Providers (auto order):".bold());
    let registry = ProviderRegistry::from_config(&config.providers);
    for entry in registry.entries() {
        let spec = entry.spec();
        let key = if entry.has_credential() {
            format!("key {}", redact_key(entry.config().api_key.trim()))
        } else {
            format!("set {}", spec.env_key)
        };
        println!(
            "    {:<12} {:<24} {} {}",
            spec.display_name,
            entry.default_model().dimmed(),
            helpers::availability_mark(entry.has_credential(), entry.is_available()),
            format!("({key})").dimmed(),
        );
    }

    println!();
    Ok(())
}
