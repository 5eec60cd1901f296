//! Config loader — reads `~/.modelrelay/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.modelrelay/config.json` (or an explicit path)
//! 3. Provider credential variables (`OPENAI_API_KEY`, …) fill empty keys
//! 4. Environment variables `MODELRELAY_<SECTION>__<FIELD>` override everything

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Provider id → standard credential variable.
pub const CREDENTIAL_ENV_VARS: &[(&str, &str)] = &[
    ("openai", "OPENAI_API_KEY"),
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("deepseek", "DEEPSEEK_API_KEY"),
];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given (or default) path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    let config = load_config_from_path(&config_path);
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment overrides on top of a loaded config.
///
/// `lookup` resolves a variable name; `load_config` passes `std::env::var`.
///
/// Supported overrides:
/// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `DEEPSEEK_API_KEY` → fill empty `providers.<id>.api_key`
/// - `MODELRELAY_PROVIDERS__<ID>__API_KEY` → `providers.<id>.api_key`
/// - `MODELRELAY_PROVIDERS__<ID>__API_BASE` → `providers.<id>.api_base`
/// - `MODELRELAY_PROVIDERS__<ID>__DEFAULT_MODEL` → `providers.<id>.default_model`
/// - `MODELRELAY_ROUTING__CHAT_MAX_TOKENS` → `routing.chat_max_tokens`
/// - `MODELRELAY_ROUTING__CODE_MAX_TOKENS` → `routing.code_max_tokens`
/// - `MODELRELAY_ROUTING__TEMPERATURE` → `routing.temperature`
/// - `MODELRELAY_ROUTING__TIMEOUT_SECS` → `routing.timeout_secs`
/// - `MODELRELAY_SERVER__HOST` → `server.host`
/// - `MODELRELAY_SERVER__PORT` → `server.port`
/// - `MODELRELAY_SERVER__CORS_ORIGINS` → `server.cors_origins` (comma-separated)
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    for &(id, var) in CREDENTIAL_ENV_VARS {
        if let Some(provider) = config.providers.get_by_name_mut(id) {
            if !provider.is_configured() {
                if let Some(val) = lookup(var).filter(|v| !v.trim().is_empty()) {
                    provider.api_key = val;
                }
            }
            apply_provider_env(provider, &id.to_uppercase(), &lookup);
        }
    }

    // Routing
    if let Some(n) = parse_var(&lookup, "MODELRELAY_ROUTING__CHAT_MAX_TOKENS") {
        config.routing.chat_max_tokens = n;
    }
    if let Some(n) = parse_var(&lookup, "MODELRELAY_ROUTING__CODE_MAX_TOKENS") {
        config.routing.code_max_tokens = n;
    }
    if let Some(t) = parse_var(&lookup, "MODELRELAY_ROUTING__TEMPERATURE") {
        config.routing.temperature = t;
    }
    if let Some(s) = parse_var(&lookup, "MODELRELAY_ROUTING__TIMEOUT_SECS") {
        config.routing.timeout_secs = s;
    }

    // Server
    if let Some(val) = lookup("MODELRELAY_SERVER__HOST") {
        config.server.host = val;
    }
    if let Some(p) = parse_var(&lookup, "MODELRELAY_SERVER__PORT") {
        config.server.port = p;
    }
    if let Some(val) = lookup("MODELRELAY_SERVER__CORS_ORIGINS") {
        config.server.cors_origins = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env<F>(provider: &mut ProviderConfig, name: &str, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(&format!("MODELRELAY_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Some(val) = lookup(&format!("MODELRELAY_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
    if let Some(val) = lookup(&format!("MODELRELAY_PROVIDERS__{name}__DEFAULT_MODEL")) {
        provider.default_model = Some(val);
    }
}

/// Parse a variable, ignoring (with a warning) values that don't parse.
fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", key, raw);
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.routing.timeout_secs, 60);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "providers": { "openai": { "apiKey": "sk-file" } },
            "routing": { "chatMaxTokens": 512 }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.providers.openai.api_key, "sk-file");
        assert_eq!(config.routing.chat_max_tokens, 512);
        // Default preserved
        assert_eq!(config.routing.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.routing.code_max_tokens, 2000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.providers.anthropic.api_key = "sk-ant-test".to_string();
        config.server.port = 9000;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.providers.anthropic.api_key, "sk-ant-test");
        assert_eq!(reloaded.server.port, 9000);
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(raw["routing"].get("timeoutSecs").is_some());
        assert!(raw["routing"].get("timeout_secs").is_none());
    }

    #[test]
    fn test_credential_var_fills_empty_key() {
        let config = apply_env_overrides(
            Config::default(),
            env(&[("ANTHROPIC_API_KEY", "sk-ant-env")]),
        );
        assert_eq!(config.providers.anthropic.api_key, "sk-ant-env");
        assert!(!config.providers.openai.is_configured());
    }

    #[test]
    fn test_credential_var_does_not_replace_file_key() {
        let mut base = Config::default();
        base.providers.openai.api_key = "sk-file".to_string();
        let config = apply_env_overrides(base, env(&[("OPENAI_API_KEY", "sk-env")]));
        assert_eq!(config.providers.openai.api_key, "sk-file");
    }

    #[test]
    fn test_blank_credential_var_ignored() {
        let config = apply_env_overrides(Config::default(), env(&[("DEEPSEEK_API_KEY", "  ")]));
        assert!(!config.providers.deepseek.is_configured());
    }

    #[test]
    fn test_prefixed_override_wins() {
        let mut base = Config::default();
        base.providers.openai.api_key = "sk-file".to_string();
        let config = apply_env_overrides(
            base,
            env(&[
                ("MODELRELAY_PROVIDERS__OPENAI__API_KEY", "sk-override"),
                ("MODELRELAY_PROVIDERS__OPENAI__API_BASE", "http://localhost:1234/v1"),
                ("MODELRELAY_PROVIDERS__DEEPSEEK__DEFAULT_MODEL", "deepseek-coder"),
            ]),
        );
        assert_eq!(config.providers.openai.api_key, "sk-override");
        assert_eq!(
            config.providers.openai.api_base.as_deref(),
            Some("http://localhost:1234/v1")
        );
        assert_eq!(
            config.providers.deepseek.default_model.as_deref(),
            Some("deepseek-coder")
        );
    }

    #[test]
    fn test_routing_and_server_overrides() {
        let config = apply_env_overrides(
            Config::default(),
            env(&[
                ("MODELRELAY_ROUTING__TIMEOUT_SECS", "30"),
                ("MODELRELAY_ROUTING__TEMPERATURE", "0.2"),
                ("MODELRELAY_SERVER__PORT", "9999"),
                ("MODELRELAY_SERVER__CORS_ORIGINS", "http://a.test, http://b.test"),
            ]),
        );
        assert_eq!(config.routing.timeout_secs, 30);
        assert_eq!(config.routing.temperature, 0.2);
        assert_eq!(config.server.port, 9999);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn test_unparseable_override_ignored() {
        let config = apply_env_overrides(
            Config::default(),
            env(&[("MODELRELAY_SERVER__PORT", "not-a-port")]),
        );
        assert_eq!(config.server.port, 8000);
    }
}
