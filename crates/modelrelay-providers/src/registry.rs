//! Provider registry — static specs for the supported upstreams plus the
//! runtime availability state built from configuration.
//!
//! `PROVIDERS` is ordered by auto-mode precedence: OpenAI → Anthropic → DeepSeek.
//! A provider is *available* when it has a non-empty credential and its
//! simulated-down flag is clear. The flags are the only process-wide mutable
//! state; they are plain atomics flipped by `toggle_down`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use modelrelay_core::config::{ProviderConfig, ProvidersConfig};
use modelrelay_core::error::RelayError;
use modelrelay_core::types::ModelInfo;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Request envelope a provider speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST {base}/chat/completions`, Bearer auth.
    OpenAiChat,
    /// `POST {base}/messages`, `x-api-key` + `anthropic-version`.
    AnthropicMessages,
}

/// A model offered by a provider.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    /// Model id sent upstream (e.g. `"gpt-4"`).
    pub id: &'static str,
    /// Human-readable name (e.g. `"GPT-4"`).
    pub name: &'static str,
}

/// Static specification describing one upstream provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal id (e.g. `"anthropic"`).
    pub id: &'static str,
    /// Human-readable name for logs and toggle messages.
    pub display_name: &'static str,
    /// Alternative ids accepted by the toggle routes (e.g. `"claude"`).
    pub aliases: &'static [&'static str],
    /// Standard environment variable holding the credential.
    pub env_key: &'static str,
    /// Envelope used by the transport.
    pub wire: WireFormat,
    /// Default API base URL.
    pub default_api_base: &'static str,
    /// Model used in auto mode.
    pub default_model: &'static str,
    /// Offered models, in listing order.
    pub models: &'static [ModelSpec],
}

impl ProviderSpec {
    /// Whether `name` is this provider's id or one of its aliases.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.id == name || self.aliases.iter().any(|a| *a == name)
    }

    fn model(&self, id: &str) -> Option<&'static ModelSpec> {
        self.models.iter().find(|m| m.id == id)
    }
}

/// Supported providers, in auto-mode precedence order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // 1. OpenAI
    ProviderSpec {
        id: "openai",
        display_name: "OpenAI",
        aliases: &["gpt"],
        env_key: "OPENAI_API_KEY",
        wire: WireFormat::OpenAiChat,
        default_api_base: "https://api.openai.com/v1",
        default_model: "gpt-4",
        models: &[
            ModelSpec {
                id: "gpt-4",
                name: "GPT-4",
            },
            ModelSpec {
                id: "gpt-4-turbo",
                name: "GPT-4 Turbo",
            },
            ModelSpec {
                id: "gpt-3.5-turbo",
                name: "GPT-3.5 Turbo",
            },
        ],
    },
    // 2. Anthropic
    ProviderSpec {
        id: "anthropic",
        display_name: "Claude",
        aliases: &["claude"],
        env_key: "ANTHROPIC_API_KEY",
        wire: WireFormat::AnthropicMessages,
        default_api_base: "https://api.anthropic.com/v1",
        default_model: "claude-3-5-sonnet-20240620",
        models: &[
            ModelSpec {
                id: "claude-3-sonnet-20240229",
                name: "Claude 3 Sonnet",
            },
            ModelSpec {
                id: "claude-3-5-sonnet-20240620",
                name: "Claude 3.5 Sonnet",
            },
        ],
    },
    // 3. DeepSeek
    ProviderSpec {
        id: "deepseek",
        display_name: "DeepSeek",
        aliases: &[],
        env_key: "DEEPSEEK_API_KEY",
        wire: WireFormat::OpenAiChat,
        default_api_base: "https://api.deepseek.com/v1",
        default_model: "deepseek-chat",
        models: &[
            ModelSpec {
                id: "deepseek-chat",
                name: "DeepSeek Chat",
            },
            ModelSpec {
                id: "deepseek-coder",
                name: "DeepSeek Coder",
            },
        ],
    },
];

// ─────────────────────────────────────────────
// Matching functions
// ─────────────────────────────────────────────

/// Find a provider spec by id or alias.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.matches_name(name))
}

// ─────────────────────────────────────────────
// Runtime state
// ─────────────────────────────────────────────

/// State reported by a toggle: `UP` when traffic may flow, `DOWN` when simulated out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SimulationState {
    Up,
    Down,
}

impl SimulationState {
    fn from_down(down: bool) -> Self {
        if down {
            SimulationState::Down
        } else {
            SimulationState::Up
        }
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationState::Up => f.write_str("UP"),
            SimulationState::Down => f.write_str("DOWN"),
        }
    }
}

/// One provider as configured for this process.
pub struct ProviderEntry {
    spec: &'static ProviderSpec,
    config: ProviderConfig,
    models: Vec<&'static ModelSpec>,
    default_model: String,
    simulated_down: AtomicBool,
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("provider", &self.spec.id)
            .field("configured", &self.has_credential())
            .field("models", &self.models.len())
            .field("default_model", &self.default_model)
            .field("simulated_down", &self.is_simulated_down())
            .finish()
    }
}

impl ProviderEntry {
    /// Build an entry from a spec and its config section.
    ///
    /// Unknown ids in `config.models` are dropped with a warning.
    pub fn new(spec: &'static ProviderSpec, config: ProviderConfig) -> Self {
        let models = match &config.models {
            None => spec.models.iter().collect(),
            Some(allowed) => allowed
                .iter()
                .filter_map(|id| {
                    let found = spec.model(id);
                    if found.is_none() {
                        warn!(provider = spec.id, model = %id, "Ignoring unknown model in config");
                    }
                    found
                })
                .collect(),
        };

        let default_model = config
            .default_model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| spec.default_model.to_string());

        ProviderEntry {
            spec,
            config,
            models,
            default_model,
            simulated_down: AtomicBool::new(false),
        }
    }

    pub fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn has_credential(&self) -> bool {
        self.config.is_configured()
    }

    pub fn is_simulated_down(&self) -> bool {
        self.simulated_down.load(Ordering::Relaxed)
    }

    /// Credential present and not simulated down.
    pub fn is_available(&self) -> bool {
        self.has_credential() && !self.is_simulated_down()
    }

    pub fn offers(&self, model: &str) -> bool {
        self.models.iter().any(|m| m.id == model)
    }
}

/// Diagnostic view of one provider (for `/health` and `status`).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProviderStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub configured: bool,
    pub simulated: SimulationState,
    pub available: bool,
}

/// Runtime provider registry. Shared behind an `Arc` by every request.
#[derive(Debug)]
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    /// Build the registry from configuration, one entry per known provider.
    pub fn from_config(providers: &ProvidersConfig) -> Self {
        let entries = PROVIDERS
            .iter()
            .map(|spec| {
                let config = providers.get_by_name(spec.id).cloned().unwrap_or_default();
                ProviderEntry::new(spec, config)
            })
            .collect();
        let registry = Self::from_entries(entries);
        info!(
            available = registry.auto_candidates().len(),
            "Provider registry initialised"
        );
        registry
    }

    /// Build from explicit entries. Entries are kept in `PROVIDERS` order.
    pub fn from_entries(mut entries: Vec<ProviderEntry>) -> Self {
        entries.sort_by_key(|e| precedence(e.spec.id));
        Self { entries }
    }

    /// All entries in precedence order.
    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    /// Entry by id or alias.
    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.spec.matches_name(name))
    }

    /// Models of every available provider; a single mock entry when none qualify.
    pub fn list_available_models(&self) -> Vec<ModelInfo> {
        let mut models: Vec<ModelInfo> = self
            .entries
            .iter()
            .filter(|e| e.is_available())
            .flat_map(|e| {
                e.models.iter().map(move |m| ModelInfo {
                    id: m.id.to_string(),
                    name: m.name.to_string(),
                    provider: e.spec.id.to_string(),
                })
            })
            .collect();

        if models.is_empty() {
            models.push(ModelInfo::mock());
        }
        models
    }

    /// Whether `model` is offered by `provider`.
    pub fn is_model_of(&self, model: &str, provider: &str) -> bool {
        self.get(provider).is_some_and(|e| e.offers(model))
    }

    /// The entry offering `model`, regardless of availability.
    pub fn owner_of(&self, model: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.offers(model))
    }

    /// Whether the provider is available for routing. Unknown ids are not.
    pub fn is_available(&self, provider: &str) -> bool {
        self.get(provider).is_some_and(ProviderEntry::is_available)
    }

    /// Available providers in auto-mode precedence order.
    pub fn auto_candidates(&self) -> Vec<&ProviderEntry> {
        self.entries.iter().filter(|e| e.is_available()).collect()
    }

    /// Flip the simulated-down flag and return the new state.
    pub fn toggle_down(&self, provider: &str) -> Result<SimulationState, RelayError> {
        let entry = self.get(provider).ok_or_else(|| RelayError::UnknownProvider {
            provider: provider.to_string(),
        })?;
        let was_down = entry.simulated_down.fetch_xor(true, Ordering::Relaxed);
        let state = SimulationState::from_down(!was_down);
        info!(provider = entry.spec.id, state = %state, "Simulation toggled");
        Ok(state)
    }

    /// Diagnostic state of every provider.
    pub fn status(&self) -> Vec<ProviderStatus> {
        self.entries
            .iter()
            .map(|e| ProviderStatus {
                id: e.spec.id,
                name: e.spec.display_name,
                configured: e.has_credential(),
                simulated: SimulationState::from_down(e.is_simulated_down()),
                available: e.is_available(),
            })
            .collect()
    }
}

fn precedence(id: &str) -> usize {
    PROVIDERS
        .iter()
        .position(|s| s.id == id)
        .unwrap_or(usize::MAX)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
