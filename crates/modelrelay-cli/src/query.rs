//! One-shot commands: `models`, `chat`, `code`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::info;

use modelrelay_core::config::load_config;
use modelrelay_core::types::{ChatRequest, CodeRequest, Routed};
use modelrelay_core::RelayError;
use modelrelay_providers::registry::ProviderRegistry;
use modelrelay_router::Router;

use crate::helpers;

/// Print the models that can currently be routed to.
pub fn models(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let registry = ProviderRegistry::from_config(&config.providers);

    println!();
    for model in registry.list_available_models() {
        println!(
            "  {:<30} {:<20} {}",
            model.id.bold(),
            model.name,
            model.provider.dimmed()
        );
    }
    println!();
    Ok(())
}

/// Route one chat message.
pub async fn chat(config_path: Option<&Path>, message: String, model: Option<String>) -> Result<()> {
    let router = build_router(config_path)?;
    let mut request = ChatRequest::new(message);
    request.model = model;

    info!(model = ?request.model, "Routing chat request");
    report(router.route_chat(request).await)
}

/// Route one code-generation request.
pub async fn code(
    config_path: Option<&Path>,
    prompt: String,
    language: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let router = build_router(config_path)?;
    let request = CodeRequest {
        prompt,
        model,
        language,
    };

    info!(model = ?request.model, language = ?request.language, "Routing code request");
    report(router.route_code(request).await)
}

fn build_router(config_path: Option<&Path>) -> Result<Router> {
    let config = load_config(config_path);
    Router::from_config(&config).context("failed to build provider transports")
}

fn report(outcome: Result<Routed, RelayError>) -> Result<()> {
    match outcome {
        Ok(routed) => {
            helpers::print_response(&routed.text, &routed.model);
            Ok(())
        }
        Err(e) => {
            helpers::print_failure(&e);
            bail!("request failed with status {}", e.status_code())
        }
    }
}
