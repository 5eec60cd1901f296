//! Generic HTTP transport, parameterized by the provider's wire format.
//!
//! One `HttpTransport` per configured provider. The provider's `WireFormat`
//! decides the endpoint path, auth headers, request envelope, and how the
//! generated text is pulled out of the response:
//!
//! - `OpenAiChat` (OpenAI, DeepSeek): `POST {base}/chat/completions`, Bearer auth
//! - `AnthropicMessages` (Claude): `POST {base}/messages`, `x-api-key`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use modelrelay_core::config::ProviderConfig;
use modelrelay_core::error::TransportError;
use modelrelay_core::utils::truncate_string;
use modelrelay_core::types::{
    ChatCompletionRequest, ChatCompletionResponse, Message, MessagesRequest, MessagesResponse,
};

use crate::registry::{ProviderRegistry, ProviderSpec, WireFormat};
use crate::traits::{CompletionRequest, Transport};

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────
// HttpTransport
// ─────────────────────────────────────────────

/// Talks to one provider over HTTPS.
pub struct HttpTransport {
    /// HTTP client (connection-pooled, bounded timeout).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// Credential.
    api_key: String,
    /// Timeout applied to the whole call.
    timeout: Duration,
    /// Static provider spec (id, wire format).
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("provider", &self.spec.id)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport from a provider config and spec.
    ///
    /// The API base is `config.api_base` when set, otherwise the provider default.
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(HttpTransport {
            client,
            api_base,
            api_key: config.api_key.clone(),
            timeout,
            spec,
        })
    }

    /// Full endpoint URL for this provider's wire format.
    fn endpoint_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        match self.spec.wire {
            WireFormat::OpenAiChat => format!("{}/chat/completions", base),
            WireFormat::AnthropicMessages => format!("{}/messages", base),
        }
    }

    /// Build the request with the right auth headers and body.
    fn build_request(&self, request: &CompletionRequest) -> reqwest::RequestBuilder {
        let url = self.endpoint_url();
        match self.spec.wire {
            WireFormat::OpenAiChat => {
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = &request.system {
                    messages.push(Message::system(system.clone()));
                }
                messages.push(Message::user(request.message.clone()));

                let body = ChatCompletionRequest {
                    model: request.model.clone(),
                    messages,
                    max_tokens: Some(request.config.max_tokens),
                    temperature: Some(request.config.temperature),
                };
                self.client
                    .post(url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
            }
            WireFormat::AnthropicMessages => {
                let body = MessagesRequest {
                    model: request.model.clone(),
                    max_tokens: request.config.max_tokens,
                    messages: vec![Message::user(request.message.clone())],
                    system: request.system.clone(),
                    temperature: Some(request.config.temperature),
                };
                self.client
                    .post(url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body)
            }
        }
    }

    /// Send, check the status, and decode the body as `T`.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = builder.send().await.map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.id,
                status = %status,
                body = %truncate_string(&body, 500),
                "API error"
            );
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                self.map_reqwest(e)
            } else {
                TransportError::Decode(e.to_string())
            }
        })
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        debug!(
            provider = self.spec.id,
            model = %request.model,
            max_tokens = request.config.max_tokens,
            "Calling provider"
        );

        let builder = self.build_request(request);
        let text = match self.spec.wire {
            WireFormat::OpenAiChat => self
                .send::<ChatCompletionResponse>(builder)
                .await?
                .into_text(),
            WireFormat::AnthropicMessages => {
                self.send::<MessagesResponse>(builder).await?.into_text()
            }
        };

        match text {
            Some(t) if !t.trim().is_empty() => {
                debug!(provider = self.spec.id, chars = t.len(), "Provider response received");
                Ok(t)
            }
            _ => Err(TransportError::EmptyResponse),
        }
    }

    fn provider_id(&self) -> &str {
        self.spec.id
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build one transport per provider that has a credential.
///
/// Simulated-down providers still get a transport so a later toggle can
/// bring them back without a restart.
pub fn create_transports(
    registry: &ProviderRegistry,
    timeout: Duration,
) -> Result<HashMap<String, Arc<dyn Transport>>, TransportError> {
    let mut transports: HashMap<String, Arc<dyn Transport>> = HashMap::new();
    for entry in registry.entries().iter().filter(|e| e.has_credential()) {
        let spec = entry.spec();
        let transport = HttpTransport::new(entry.config(), spec, timeout)?;
        debug!(
            provider = spec.id,
            api_base = %transport.api_base,
            "Created transport"
        );
        transports.insert(spec.id.to_string(), Arc::new(transport));
    }
    Ok(transports)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
