//! Provider layer for Modelrelay.
//!
//! # Architecture
//!
//! - [`registry`] — static specs for the supported upstreams, runtime availability
//! - [`traits::Transport`] — one call to one provider, no retries
//! - [`http_provider::HttpTransport`] — generic HTTP client, parameterized by wire format
//! - [`http_provider::create_transports`] — one transport per configured provider

pub mod http_provider;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::{create_transports, HttpTransport};
pub use registry::{ProviderRegistry, ProviderSpec, ProviderStatus, SimulationState, PROVIDERS};
pub use traits::{CompletionRequest, LlmRequestConfig, Transport};
