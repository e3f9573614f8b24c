//! Provider-agnostic facade over a resolved backend adapter

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use switchboard_config::Config;
use url::Url;

use crate::credentials::CredentialResolver;
use crate::error::LlmError;
use crate::provider::{PreparedChat, Provider, ProviderSettings};
use crate::registry;
use crate::types::{ChatParams, ChatReply};

/// Chat client bound to one backend and default model
///
/// Cheap to clone; clones share the adapter and its connection pool.
#[derive(Clone)]
pub struct Client {
    provider: Arc<dyn Provider>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("backend", &self.backend())
            .field("model", &self.model())
            .finish()
    }
}

impl Client {
    /// Create a client with the backend's default endpoint and timeout
    pub fn create(backend: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::builder(backend, model).build()
    }

    /// Start configuring a client
    pub fn builder(backend: &str, model: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            backend: backend.to_owned(),
            model: model.into(),
            endpoint: None,
            timeout: None,
            api_key: None,
            credential_store: None,
        }
    }

    /// Create a client applying the overrides in `config`
    ///
    /// `model` wins over the configured model; one of the two must be set.
    pub fn from_config(config: &Config, backend: &str, model: Option<String>) -> Result<Self, LlmError> {
        let overrides = config.backend(backend).cloned().unwrap_or_default();

        let model = model.or(overrides.model.clone()).ok_or_else(|| {
            LlmError::InvalidConfiguration(format!("no model given and none configured for backend `{backend}`"))
        })?;

        let mut builder = Self::builder(backend, model);

        if let Some(endpoint) = overrides.endpoint.clone() {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(timeout) = overrides
            .timeout()
            .map_err(|e| LlmError::InvalidConfiguration(e.to_string()))?
        {
            builder = builder.with_timeout(timeout);
        }
        if let Some(path) = &config.credentials {
            builder = builder.with_credential_store(path.clone());
        }

        builder.build()
    }

    /// Wrap an already constructed adapter
    pub fn from_provider(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Registry name of the backend
    pub fn backend(&self) -> &str {
        self.provider.name()
    }

    /// Default model
    pub fn model(&self) -> &str {
        self.provider.default_model()
    }

    /// The underlying adapter
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Run a chat call
    pub async fn chat(&self, params: ChatParams) -> Result<ChatReply, LlmError> {
        self.provider.chat(params).await
    }

    /// Assemble the request a chat call would send, without sending it
    pub fn prepare(&self, params: ChatParams) -> Result<PreparedChat, LlmError> {
        self.provider.prepare(params)
    }

    /// Models the backend serves
    pub async fn models(&self) -> Result<Vec<String>, LlmError> {
        self.provider.list_models().await
    }
}

/// Builder for [`Client`]
#[derive(Debug)]
pub struct ClientBuilder {
    backend: String,
    model: String,
    endpoint: Option<Url>,
    timeout: Option<Duration>,
    api_key: Option<SecretString>,
    credential_store: Option<PathBuf>,
}

impl ClientBuilder {
    /// Override the backend's base URL
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Override the per-request deadline
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use this key instead of resolving one
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Read fallback credentials from this file
    #[must_use]
    pub fn with_credential_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_store = Some(path.into());
        self
    }

    /// Resolve the backend and its credential, then construct the adapter
    pub fn build(self) -> Result<Client, LlmError> {
        let spec = registry::lookup(&self.backend)?;

        let api_key = match self.api_key {
            Some(key) => Some(key),
            None => {
                let resolver = self
                    .credential_store
                    .map_or_else(CredentialResolver::default, CredentialResolver::with_store);
                resolver.resolve(spec.name, spec.requires_credential)?
            }
        };

        let endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => Url::parse(spec.default_endpoint).map_err(|e| {
                LlmError::InvalidConfiguration(format!("invalid endpoint `{}`: {e}", spec.default_endpoint))
            })?,
        };

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(LlmError::InvalidConfiguration(format!(
                "endpoint `{endpoint}` must use http or https"
            )));
        }

        let settings = ProviderSettings {
            name: spec.name.to_owned(),
            model: self.model,
            endpoint,
            timeout: self.timeout.unwrap_or(spec.default_timeout),
            api_key,
        };

        tracing::debug!(
            provider = %settings.name,
            model = %settings.model,
            endpoint = %settings.endpoint,
            "creating client"
        );

        Ok(Client {
            provider: (spec.constructor)(settings)?,
        })
    }
}
