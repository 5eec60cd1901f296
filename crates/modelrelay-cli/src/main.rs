//! Modelrelay CLI — entry point.
//!
//! # Commands
//!
//! - `modelrelay serve [--host H] [--port P]` — start the HTTP gateway
//! - `modelrelay status` — show configuration and provider status
//! - `modelrelay models` — list the models that can currently be routed to
//! - `modelrelay chat -m MESSAGE [--model ID]` — one-shot chat request
//! - `modelrelay code -p PROMPT [--language L] [--model ID]` — one-shot code request
//! - `modelrelay init` — write a default config file

mod helpers;
mod init;
mod query;
mod serve;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// ⚡ Modelrelay — multi-provider LLM relay with automatic fallback
#[derive(Parser)]
#[command(name = "modelrelay", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.modelrelay/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// List the models that can currently be routed to
    Models,

    /// Send one chat message
    Chat {
        /// Message text
        #[arg(short, long)]
        message: String,

        /// Model id, or "auto" for fallback routing
        #[arg(long)]
        model: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Generate code for a task
    Code {
        /// Task description
        #[arg(short, long)]
        prompt: String,

        /// Target language (e.g. "python")
        #[arg(short, long)]
        language: Option<String>,

        /// Model id, or "auto" for fallback routing
        #[arg(long)]
        model: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Write a default config file
    Init,
}

impl Commands {
    /// `--logs` flag and fallback log level. Every command logs so config
    /// load warnings reach the terminal.
    fn logging(&self) -> (bool, &'static str) {
        match self {
            Commands::Serve { logs, .. } => (*logs, "info"),
            Commands::Chat { logs, .. } | Commands::Code { logs, .. } => (*logs, "warn"),
            Commands::Status | Commands::Models | Commands::Init => (false, "warn"),
        }
    }
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional; its variables feed the credential lookup.
    let dotenv = dotenvy::dotenv();

    let config_path: Option<PathBuf> = cli.config.as_deref().map(helpers::expand_tilde);
    let config_path = config_path.as_deref();

    let (verbose, default_level) = cli.command.logging();
    init_logging(verbose, default_level);
    log_dotenv(&dotenv);

    match cli.command {
        Commands::Serve { host, port, .. } => serve::run(config_path, host, port).await,
        Commands::Status => status::run(config_path),
        Commands::Models => query::models(config_path),
        Commands::Chat { message, model, .. } => query::chat(config_path, message, model).await,
        Commands::Code {
            prompt,
            language,
            model,
            ..
        } => query::code(config_path, prompt, language, model).await,
        Commands::Init => init::run(config_path),
    }
}

fn log_dotenv(result: &Result<PathBuf, dotenvy::Error>) {
    match result {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file"),
        Err(e) => tracing::warn!("Failed to load .env: {}", e),
    }
}

/// Initialize tracing/logging.
///
/// `--logs` forces debug output for our crates; otherwise `RUST_LOG` wins,
/// falling back to `default`.
fn init_logging(verbose: bool, default: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("modelrelay=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
