//! Configuration system (layered: plugin config > env > built-in default).

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Key of this integration under `plugins.entries`.
pub const PLUGIN_ID: &str = "solvapay";
/// Environment fallback for the API key.
pub const API_KEY_ENV: &str = "SOLVAPAY_API_KEY";
/// Environment fallback for the MCP endpoint.
pub const ENDPOINT_ENV: &str = "SOLVAPAY_MCP_ENDPOINT";
/// Hosted SolvaPay MCP server.
pub const DEFAULT_ENDPOINT: &str = "https://mcp.solvapay.com/mcp";

static DOTENV_LOADED: OnceLock<()> = OnceLock::new();

/// Host configuration object handed to plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub plugins: Option<PluginsConfig>,
}

/// The `plugins` section of the host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default)]
    pub entries: HashMap<String, PluginEntry>,
}

/// A single `plugins.entries.<id>` record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginEntry {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

impl HostConfig {
    /// Build a host config carrying a single plugin entry.
    pub fn with_plugin(id: impl Into<String>, config: serde_json::Value) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            id.into(),
            PluginEntry {
                enabled: Some(true),
                config: Some(config),
            },
        );
        Self {
            plugins: Some(PluginsConfig { entries }),
        }
    }

    /// Look up and decode `plugins.entries.<id>.config`.
    ///
    /// A config object that does not decode is treated as absent.
    pub fn plugin_config(&self, id: &str) -> Option<PluginConfig> {
        let raw = self
            .plugins
            .as_ref()?
            .entries
            .get(id)?
            .config
            .as_ref()?;

        match serde_json::from_value(raw.clone()) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(plugin = id, error = %e, "ignoring malformed plugin config");
                None
            }
        }
    }
}

/// Plugin-supplied settings for this integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Fully resolved connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub endpoint: String,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_key", &"..")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Source of environment-style fallback values.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment, loading `.env` once if present.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        DOTENV_LOADED.get_or_init(|| {
            let _ = dotenvy::dotenv(); // load .env if present, ignore error
        });
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Resolve the API key and endpoint.
///
/// Each field resolves independently: plugin config, then environment, then
/// (endpoint only) [`DEFAULT_ENDPOINT`]. Empty strings count as unset.
pub fn resolve_config(
    plugin: Option<&PluginConfig>,
    env: &dyn EnvSource,
) -> Result<ResolvedConfig> {
    let api_key = non_empty(plugin.and_then(|p| p.api_key.clone()))
        .or_else(|| non_empty(env.var(API_KEY_ENV)))
        .ok_or_else(|| {
            BridgeError::ConfigurationMissing(format!(
                "Set plugins.entries.{PLUGIN_ID}.config.apiKey or {API_KEY_ENV} env var."
            ))
        })?;

    let endpoint = non_empty(plugin.and_then(|p| p.endpoint.clone()))
        .or_else(|| non_empty(env.var(ENDPOINT_ENV)))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    Ok(ResolvedConfig { api_key, endpoint })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn plugin(api_key: Option<&str>, endpoint: Option<&str>) -> PluginConfig {
        PluginConfig {
            api_key: api_key.map(str::to_string),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn plugin_config_wins_over_env() {
        let resolved = resolve_config(
            Some(&plugin(Some("sk_config"), Some("https://custom.example.com/mcp"))),
            &env(&[
                (API_KEY_ENV, "sk_env"),
                (ENDPOINT_ENV, "https://env.example.com/mcp"),
            ]),
        )
        .expect("config should resolve");

        assert_eq!(resolved.api_key, "sk_config");
        assert_eq!(resolved.endpoint, "https://custom.example.com/mcp");
    }

    #[test]
    fn env_fills_each_missing_field_independently() {
        let resolved = resolve_config(
            Some(&plugin(None, Some("https://custom.example.com/mcp"))),
            &env(&[
                (API_KEY_ENV, "sk_env"),
                (ENDPOINT_ENV, "https://env.example.com/mcp"),
            ]),
        )
        .expect("config should resolve");

        assert_eq!(resolved.api_key, "sk_env");
        assert_eq!(resolved.endpoint, "https://custom.example.com/mcp");

        let resolved = resolve_config(
            Some(&plugin(Some("sk_config"), None)),
            &env(&[(ENDPOINT_ENV, "https://env.example.com/mcp")]),
        )
        .expect("config should resolve");
        assert_eq!(resolved.endpoint, "https://env.example.com/mcp");
    }

    #[test]
    fn endpoint_defaults_when_unset() {
        let resolved = resolve_config(Some(&plugin(Some("sk_config"), None)), &env(&[]))
            .expect("config should resolve");
        assert_eq!(resolved.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn empty_strings_count_as_unset() {
        let resolved = resolve_config(
            Some(&plugin(Some(""), Some(""))),
            &env(&[(API_KEY_ENV, "sk_env"), (ENDPOINT_ENV, "")]),
        )
        .expect("config should resolve");
        assert_eq!(resolved.api_key, "sk_env");
        assert_eq!(resolved.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn missing_api_key_is_configuration_missing() {
        let err = resolve_config(None, &env(&[(ENDPOINT_ENV, "https://env.example.com/mcp")]))
            .expect_err("missing key should fail");
        assert!(matches!(err, BridgeError::ConfigurationMissing(_)));
    }

    #[test]
    fn host_config_decodes_plugin_entry() {
        let host: HostConfig = serde_json::from_value(json!({
            "plugins": {
                "entries": {
                    "solvapay": {
                        "enabled": true,
                        "config": { "apiKey": "sk_sandbox", "endpoint": "https://x.example/mcp" }
                    }
                }
            }
        }))
        .expect("host config should deserialize");

        assert_eq!(
            host.plugin_config(PLUGIN_ID),
            Some(plugin(Some("sk_sandbox"), Some("https://x.example/mcp")))
        );
        assert_eq!(host.plugin_config("other"), None);
    }

    #[test]
    fn malformed_plugin_config_is_ignored() {
        let host = HostConfig::with_plugin(PLUGIN_ID, json!({ "apiKey": 42 }));
        assert_eq!(host.plugin_config(PLUGIN_ID), None);

        let empty = HostConfig::default();
        assert_eq!(empty.plugin_config(PLUGIN_ID), None);
    }

    #[test]
    fn resolved_config_debug_redacts_key() {
        let resolved = ResolvedConfig {
            api_key: "sk_secret".into(),
            endpoint: DEFAULT_ENDPOINT.into(),
        };
        let rendered = format!("{resolved:?}");
        assert!(!rendered.contains("sk_secret"));
        assert!(rendered.contains(DEFAULT_ENDPOINT));
    }
}
