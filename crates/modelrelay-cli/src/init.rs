//! `modelrelay init` — write a default config file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use modelrelay_core::config::{get_config_path, save_config, Config};
use modelrelay_providers::registry::PROVIDERS;

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "⚡ Modelrelay — Setup".cyan().bold());
    println!();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    if write_default_config(&path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            path.display()
        );
    }

    println!();
    println!("  Add at least one API key, in the config file or the environment:");
    for spec in PROVIDERS {
        println!("    {:<20} {}", spec.env_key.bold(), spec.display_name.dimmed());
    }
    println!();
    println!(
        "{}",
        "  Setup complete! Run `modelrelay serve` to start the gateway.".green()
    );
    println!();

    Ok(())
}

/// Write `Config::default()` to `path` unless a file is already there.
/// Returns whether a file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(true)
}
