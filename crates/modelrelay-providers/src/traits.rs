//! Transport trait — one synchronous call to one provider.
//!
//! `HttpTransport` in `http_provider.rs` implements it for every provider in
//! the registry. The router only ever sees `dyn Transport`, so tests can swap
//! in scripted implementations.

use async_trait::async_trait;
use modelrelay_core::error::TransportError;

/// Sampling parameters passed to each call.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

/// Everything a transport needs for one completion.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// Model id sent upstream.
    pub model: String,
    /// The user message.
    pub message: String,
    /// Optional system instruction.
    pub system: Option<String>,
    /// Token budget and temperature.
    pub config: LlmRequestConfig,
}

/// A single-attempt call to one provider.
///
/// Implementations never retry; moving on to another provider is the
/// router's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the call and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;

    /// Provider id this transport talks to (e.g. `"openai"`).
    fn provider_id(&self) -> &str;
}
