//! Shared CLI helpers — path expansion, output formatting, banner.

use std::path::PathBuf;

use colored::Colorize;

use modelrelay_core::error::RelayError;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a routed response to stdout.
pub fn print_response(text: &str, model: &str) {
    println!();
    println!("{} {}", "⚡".cyan().bold(), model.dimmed());
    if text.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{text}");
    }
    println!();
}

/// Print a routing failure: friendly message first, diagnostic detail below.
pub fn print_failure(err: &RelayError) {
    eprintln!();
    eprintln!(
        "{} {} {}",
        "✗".red().bold(),
        err.user_message().red(),
        format!("({})", err.status_code()).dimmed()
    );
    if !err.is_unavailable() {
        eprintln!("  {}", err.to_string().dimmed());
    }
    eprintln!();
}

/// Print the startup banner.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "⚡ Modelrelay".cyan().bold(), version.dimmed());
    println!();
}

/// Availability marker used by `status` and `serve`.
pub fn availability_mark(configured: bool, available: bool) -> String {
    match (configured, available) {
        (true, true) => format!("{} available", "✓".green()),
        (true, false) => format!("{} simulated down", "↓".yellow()),
        (false, _) => format!("{}", "· not configured".dimmed()),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
