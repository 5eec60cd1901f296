//! Router — picks the provider/model pairs for a request and drives the
//! transports in order until one answers.
//!
//! Two plans exist:
//! - **Explicit**: the caller named a model. Its owner is the sole candidate
//!   and a failure is returned as-is.
//! - **Auto**: fixed precedence over the available providers, each with its
//!   default model. Failures are logged and the next candidate is tried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use modelrelay_core::config::{Config, RoutingConfig};
use modelrelay_core::error::{RelayError, TransportError};
use modelrelay_core::types::{ChatRequest, CodeRequest, RouteMode, RouteRequest, Routed};
use modelrelay_providers::http_provider::create_transports;
use modelrelay_providers::registry::ProviderRegistry;
use modelrelay_providers::traits::{CompletionRequest, LlmRequestConfig, Transport};

use crate::normalize::normalize_code;
use crate::prompt::{Prompt, PromptBuilder};

// ─────────────────────────────────────────────
// Candidate planning
// ─────────────────────────────────────────────

/// One (provider, model) pair to try.
#[derive(Clone, Debug, PartialEq)]
struct Candidate {
    provider: &'static str,
    model: String,
}

/// Ordered candidates for one request.
#[derive(Debug, PartialEq)]
enum Plan {
    Explicit(Candidate),
    Auto(Vec<Candidate>),
}

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Routes chat and code requests across the configured providers.
pub struct Router {
    registry: Arc<ProviderRegistry>,
    transports: HashMap<String, Arc<dyn Transport>>,
    routing: RoutingConfig,
}

impl Router {
    /// Create a router over an existing registry and transport set.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        transports: HashMap<String, Arc<dyn Transport>>,
        routing: RoutingConfig,
    ) -> Self {
        Self {
            registry,
            transports,
            routing,
        }
    }

    /// Build the registry and one HTTP transport per configured provider.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let registry = Arc::new(ProviderRegistry::from_config(&config.providers));
        let timeout = Duration::from_secs(config.routing.timeout_secs);
        let transports = create_transports(&registry, timeout)?;
        info!(
            transports = transports.len(),
            timeout_secs = config.routing.timeout_secs,
            "Router ready"
        );
        Ok(Self::new(registry, transports, config.routing.clone()))
    }

    /// The shared provider registry.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub async fn route_chat(&self, request: ChatRequest) -> Result<Routed, RelayError> {
        self.route(request.into()).await
    }

    pub async fn route_code(&self, request: CodeRequest) -> Result<Routed, RelayError> {
        self.route(request.into()).await
    }

    /// Route one request: validate, build the prompt, walk the candidates.
    pub async fn route(&self, request: RouteRequest) -> Result<Routed, RelayError> {
        if request.text.trim().is_empty() {
            return Err(RelayError::Validation {
                field: request.mode.required_field(),
            });
        }

        let prompt = PromptBuilder::build(request.mode, &request.text, request.language.as_deref());
        let config = self.request_config(request.mode);

        let routed = match self.plan(&request)? {
            Plan::Explicit(candidate) => self.call_explicit(candidate, &prompt, &config).await?,
            Plan::Auto(candidates) => self.call_auto(candidates, &prompt, &config).await?,
        };

        match request.mode {
            RouteMode::Chat => Ok(routed),
            RouteMode::Code => Ok(Routed {
                text: normalize_code(&routed.text),
                ..routed
            }),
        }
    }

    fn request_config(&self, mode: RouteMode) -> LlmRequestConfig {
        let max_tokens = match mode {
            RouteMode::Chat => self.routing.chat_max_tokens,
            RouteMode::Code => self.routing.code_max_tokens,
        };
        LlmRequestConfig {
            max_tokens,
            temperature: self.routing.temperature,
        }
    }

    fn plan(&self, request: &RouteRequest) -> Result<Plan, RelayError> {
        let Some(model) = request.pinned_model() else {
            let candidates = self
                .registry
                .auto_candidates()
                .into_iter()
                .map(|entry| Candidate {
                    provider: entry.spec().id,
                    model: entry.default_model().to_string(),
                })
                .collect();
            return Ok(Plan::Auto(candidates));
        };

        let owner = self
            .registry
            .owner_of(model)
            .ok_or_else(|| RelayError::UnknownModel {
                model: model.to_string(),
            })?;

        if !owner.is_available() {
            warn!(
                provider = owner.spec().id,
                model = %model,
                "Requested model's provider is unavailable"
            );
            return Err(RelayError::NoProviderAvailable);
        }

        Ok(Plan::Explicit(Candidate {
            provider: owner.spec().id,
            model: model.to_string(),
        }))
    }

    async fn call_explicit(
        &self,
        candidate: Candidate,
        prompt: &Prompt,
        config: &LlmRequestConfig,
    ) -> Result<Routed, RelayError> {
        let Some(transport) = self.transports.get(candidate.provider) else {
            warn!(provider = candidate.provider, "No transport for provider");
            return Err(RelayError::NoProviderAvailable);
        };

        match self.call(transport.as_ref(), &candidate, prompt, config).await {
            Ok(routed) => Ok(routed),
            Err(e) => {
                error!(
                    provider = candidate.provider,
                    model = %candidate.model,
                    error = %e,
                    "Requested model failed"
                );
                Err(RelayError::from_transport(
                    candidate.provider,
                    &candidate.model,
                    e,
                ))
            }
        }
    }

    async fn call_auto(
        &self,
        candidates: Vec<Candidate>,
        prompt: &Prompt,
        config: &LlmRequestConfig,
    ) -> Result<Routed, RelayError> {
        for candidate in &candidates {
            let Some(transport) = self.transports.get(candidate.provider) else {
                debug!(provider = candidate.provider, "No transport, skipping");
                continue;
            };

            match self.call(transport.as_ref(), candidate, prompt, config).await {
                Ok(routed) => return Ok(routed),
                Err(e) => {
                    warn!(
                        provider = candidate.provider,
                        model = %candidate.model,
                        error = %e,
                        "Provider failed, trying next"
                    );
                }
            }
        }

        warn!(tried = candidates.len(), "No provider could serve the request");
        Err(RelayError::NoProviderAvailable)
    }

    async fn call(
        &self,
        transport: &dyn Transport,
        candidate: &Candidate,
        prompt: &Prompt,
        config: &LlmRequestConfig,
    ) -> Result<Routed, TransportError> {
        debug!(
            provider = candidate.provider,
            model = %candidate.model,
            "Routing to provider"
        );
        let request = CompletionRequest {
            model: candidate.model.clone(),
            message: prompt.message.clone(),
            system: Some(prompt.system.to_string()),
            config: config.clone(),
        };
        let text = transport.complete(&request).await?;
        Ok(Routed {
            text,
            model: candidate.model.clone(),
            provider: transport.provider_id().to_string(),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use modelrelay_core::config::ProvidersConfig;
    use modelrelay_core::error::MSG_INVALID_KEY;
    use std::sync::Mutex;

    /// Provider id and request of every call, in order.
    type CallLog = Arc<Mutex<Vec<(String, CompletionRequest)>>>;

    /// What a scripted transport does when called.
    enum Script {
        Reply(&'static str),
        Fail(fn() -> TransportError),
    }

    /// A transport that answers from a script and records every call.
    struct ScriptedTransport {
        provider: &'static str,
        script: Script,
        calls: CallLog,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((self.provider.to_string(), request.clone()));
            match &self.script {
                Script::Reply(text) => Ok(text.to_string()),
                Script::Fail(make) => Err(make()),
            }
        }

        fn provider_id(&self) -> &str {
            self.provider
        }
    }

    struct Harness {
        router: Router,
        calls: CallLog,
    }

    impl Harness {
        fn called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
        }

        fn last_request(&self) -> CompletionRequest {
            self.calls.lock().unwrap().last().unwrap().1.clone()
        }
    }

    /// Credential every listed provider and script its transport.
    fn harness(scripts: Vec<(&'static str, Script)>) -> Harness {
        let mut providers = ProvidersConfig::default();
        for (id, _) in &scripts {
            providers.get_by_name_mut(id).unwrap().api_key = format!("{id}-key");
        }
        let registry = Arc::new(ProviderRegistry::from_config(&providers));

        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let transports = scripts
            .into_iter()
            .map(|(id, script)| {
                let t: Arc<dyn Transport> = Arc::new(ScriptedTransport {
                    provider: id,
                    script,
                    calls: calls.clone(),
                });
                (id.to_string(), t)
            })
            .collect();

        Harness {
            router: Router::new(registry, transports, RoutingConfig::default()),
            calls,
        }
    }

    fn server_error() -> TransportError {
        TransportError::Http {
            status: 500,
            body: "overloaded".into(),
        }
    }

    fn bad_key() -> TransportError {
        TransportError::Http {
            status: 401,
            body: "Incorrect API key provided".into(),
        }
    }

    #[tokio::test]
    async fn test_empty_content_fails_before_any_call() {
        let h = harness(vec![("openai", Script::Reply("hi"))]);

        for text in ["", "   \n\t"] {
            let err = h.router.route_chat(ChatRequest::new(text)).await.unwrap_err();
            assert!(matches!(err, RelayError::Validation { field: "content" }));
        }
        let err = h.router.route_code(CodeRequest::new("")).await.unwrap_err();
        assert!(matches!(err, RelayError::Validation { field: "prompt" }));

        assert!(h.called().is_empty());
    }

    #[tokio::test]
    async fn test_auto_uses_precedence() {
        let h = harness(vec![
            ("deepseek", Script::Reply("from deepseek")),
            ("openai", Script::Reply("from openai")),
        ]);

        let routed = h.router.route_chat(ChatRequest::new("hi")).await.unwrap();
        assert_eq!(routed.text, "from openai");
        assert_eq!(routed.model, "gpt-4");
        assert_eq!(routed.provider, "openai");
        assert_eq!(h.called(), vec!["openai"]);
    }

    #[tokio::test]
    async fn test_auto_falls_back_after_failure() {
        let h = harness(vec![
            ("openai", Script::Fail(server_error)),
            ("anthropic", Script::Reply("Hello from Claude")),
        ]);

        let routed = h
            .router
            .route_chat(ChatRequest::new("hi").with_model("auto"))
            .await
            .unwrap();
        assert_eq!(routed.text, "Hello from Claude");
        assert_eq!(routed.model, "claude-3-5-sonnet-20240620");
        assert_eq!(h.called(), vec!["openai", "anthropic"]);
    }

    #[tokio::test]
    async fn test_auto_swallows_auth_failures_too() {
        let h = harness(vec![
            ("openai", Script::Fail(bad_key)),
            ("deepseek", Script::Reply("ok")),
        ]);

        let routed = h.router.route_chat(ChatRequest::new("hi")).await.unwrap();
        assert_eq!(routed.provider, "deepseek");
        assert_eq!(routed.model, "deepseek-chat");
    }

    #[tokio::test]
    async fn test_auto_all_fail_is_no_provider() {
        let h = harness(vec![
            ("openai", Script::Fail(server_error)),
            ("anthropic", Script::Fail(|| TransportError::Timeout { secs: 60 })),
            ("deepseek", Script::Fail(|| TransportError::EmptyResponse)),
        ]);

        let err = h.router.route_chat(ChatRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, RelayError::NoProviderAvailable));
        assert_eq!(h.called(), vec!["openai", "anthropic", "deepseek"]);
    }

    #[tokio::test]
    async fn test_no_credentials_is_no_provider() {
        let h = harness(vec![]);
        let err = h.router.route_chat(ChatRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, RelayError::NoProviderAvailable));
        assert_eq!(err.status_code().as_u16(), 503);
    }

    #[tokio::test]
    async fn test_simulated_down_is_skipped() {
        let h = harness(vec![
            ("openai", Script::Reply("from openai")),
            ("anthropic", Script::Reply("from claude")),
        ]);
        h.router.registry().toggle_down("openai").unwrap();

        let routed = h.router.route_chat(ChatRequest::new("hi")).await.unwrap();
        assert_eq!(routed.provider, "anthropic");
        assert_eq!(h.called(), vec!["anthropic"]);
    }

    #[tokio::test]
    async fn test_explicit_failure_does_not_fall_back() {
        let h = harness(vec![
            ("openai", Script::Reply("from openai")),
            ("deepseek", Script::Fail(server_error)),
        ]);

        let err = h
            .router
            .route_chat(ChatRequest::new("hi").with_model("deepseek-coder"))
            .await
            .unwrap_err();
        match &err {
            RelayError::Transport {
                provider, model, ..
            } => {
                assert_eq!(provider, "deepseek");
                assert_eq!(model, "deepseek-coder");
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
        assert_eq!(err.status_code().as_u16(), 500);
        assert_eq!(h.called(), vec!["deepseek"]);
    }

    #[tokio::test]
    async fn test_explicit_auth_failure_is_401() {
        let h = harness(vec![("openai", Script::Fail(bad_key))]);

        let err = h
            .router
            .route_chat(ChatRequest::new("hi").with_model("gpt-4-turbo"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Authorization { .. }));
        assert_eq!(err.status_code().as_u16(), 401);
        assert_eq!(err.user_message(), MSG_INVALID_KEY);
    }

    #[tokio::test]
    async fn test_explicit_model_is_sent_upstream() {
        let h = harness(vec![
            ("openai", Script::Reply("a")),
            ("anthropic", Script::Reply("b")),
        ]);

        let routed = h
            .router
            .route_chat(ChatRequest::new("hi").with_model("claude-3-sonnet-20240229"))
            .await
            .unwrap();
        assert_eq!(routed.model, "claude-3-sonnet-20240229");
        assert_eq!(h.called(), vec!["anthropic"]);
        assert_eq!(h.last_request().model, "claude-3-sonnet-20240229");
    }

    #[tokio::test]
    async fn test_explicit_unavailable_provider_hard_fails() {
        let h = harness(vec![
            ("openai", Script::Reply("a")),
            ("anthropic", Script::Reply("b")),
        ]);
        h.router.registry().toggle_down("claude").unwrap();

        let err = h
            .router
            .route_chat(ChatRequest::new("hi").with_model("claude-3-5-sonnet-20240620"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::NoProviderAvailable));
        assert!(h.called().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let h = harness(vec![("openai", Script::Reply("a"))]);

        let err = h
            .router
            .route_chat(ChatRequest::new("hi").with_model("gpt-9"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::UnknownModel { .. }));
        assert!(err.is_unavailable());
        assert!(h.called().is_empty());
    }

    #[tokio::test]
    async fn test_claude_only_chat() {
        let h = harness(vec![("anthropic", Script::Reply("Hi! How can I help?"))]);

        let routed = h
            .router
            .route_chat(ChatRequest::new("hi").with_model("auto"))
            .await
            .unwrap();
        assert!(!routed.text.is_empty());
        assert_eq!(routed.model, "claude-3-5-sonnet-20240620");

        let sent = h.last_request();
        assert_eq!(sent.message, "hi");
        assert_eq!(sent.config.max_tokens, 1000);
        assert_eq!(sent.system.as_deref(), Some(crate::prompt::CHAT_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_code_mode_strips_fence() {
        let h = harness(vec![(
            "openai",
            Script::Reply("```python\ndef add(a,b): return a+b\n```"),
        )]);

        let routed = h
            .router
            .route_code(CodeRequest::new("add two numbers").with_language("python"))
            .await
            .unwrap();
        assert_eq!(routed.text, "def add(a,b): return a+b");

        let sent = h.last_request();
        assert!(sent.message.contains("in python"));
        assert!(sent.message.contains("add two numbers"));
        assert_eq!(sent.config.max_tokens, 2000);
        assert_eq!(sent.system.as_deref(), Some(crate::prompt::CODE_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_chat_mode_keeps_fence() {
        let h = harness(vec![("openai", Script::Reply("```\nx\n```"))]);
        let routed = h.router.route_chat(ChatRequest::new("hi")).await.unwrap();
        assert_eq!(routed.text, "```\nx\n```");
    }

    #[test]
    fn test_plan_auto_uses_default_models() {
        let h = harness(vec![
            ("openai", Script::Reply("a")),
            ("deepseek", Script::Reply("c")),
        ]);
        let plan = h.router.plan(&ChatRequest::new("hi").into()).unwrap();
        assert_eq!(
            plan,
            Plan::Auto(vec![
                Candidate {
                    provider: "openai",
                    model: "gpt-4".into()
                },
                Candidate {
                    provider: "deepseek",
                    model: "deepseek-chat".into()
                },
            ])
        );
    }

    #[test]
    fn test_from_config_builds_configured_transports() {
        let mut config = Config::default();
        config.providers.openai.api_key = "sk-test".into();
        let router = Router::from_config(&config).unwrap();
        assert_eq!(router.transports.len(), 1);
        assert!(router.registry().is_available("openai"));
    }
}
