#![allow(clippy::must_use_candidate)]

mod env;
mod loader;

use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

/// Top-level switchboard configuration
///
/// ```toml
/// credentials = "/etc/switchboard/credentials"
///
/// [backends.ollama]
/// endpoint = "http://gpu-box:11434"
/// timeout = "10m"
/// model = "llama3"
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Credential store overriding the platform default
    #[serde(default)]
    pub credentials: Option<PathBuf>,
    /// Per-backend overrides, keyed by registry name
    #[serde(default)]
    pub backends: IndexMap<String, BackendConfig>,
}

impl Config {
    /// Overrides for `backend`, matched without regard to case
    pub fn backend(&self, backend: &str) -> Option<&BackendConfig> {
        self.backends
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(backend))
            .map(|(_, config)| config)
    }
}

/// Overrides for one backend
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the backend API
    #[serde(default)]
    pub endpoint: Option<Url>,
    /// Per-request deadline (e.g. "30s", "5m")
    #[serde(default)]
    pub timeout: Option<String>,
    /// Default model
    #[serde(default)]
    pub model: Option<String>,
}

impl BackendConfig {
    /// Parsed request deadline
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string cannot be parsed
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|s| duration_str::parse(s).map_err(|e| anyhow::anyhow!("invalid duration '{s}': {e}")))
            .transpose()
    }
}
