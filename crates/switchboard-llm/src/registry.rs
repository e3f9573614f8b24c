//! Static table of the backends a client can be created for

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;
use crate::provider::ollama::OllamaProvider;
use crate::provider::openai::OpenAiProvider;
use crate::provider::{Provider, ProviderSettings};

type Constructor = fn(ProviderSettings) -> Result<Arc<dyn Provider>, LlmError>;

/// Registration of one backend
#[derive(Debug, Clone, Copy)]
pub struct BackendSpec {
    /// Lowercase registry name
    pub name: &'static str,
    /// Whether an API key must be resolved before construction
    pub requires_credential: bool,
    /// Base URL used when no endpoint is configured
    pub default_endpoint: &'static str,
    /// Per-request deadline used when none is configured
    pub default_timeout: Duration,
    /// Adapter constructor
    pub constructor: Constructor,
}

static BACKENDS: &[BackendSpec] = &[
    BackendSpec {
        name: "ollama",
        requires_credential: false,
        default_endpoint: "http://localhost:11434",
        default_timeout: Duration::from_secs(300),
        constructor: ollama,
    },
    BackendSpec {
        name: "openai",
        requires_credential: true,
        default_endpoint: "https://api.openai.com/v1",
        default_timeout: Duration::from_secs(120),
        constructor: openai,
    },
    BackendSpec {
        name: "deepseek",
        requires_credential: true,
        default_endpoint: "https://api.deepseek.com/v1",
        default_timeout: Duration::from_secs(120),
        constructor: deepseek,
    },
];

fn ollama(settings: ProviderSettings) -> Result<Arc<dyn Provider>, LlmError> {
    Ok(Arc::new(OllamaProvider::new(settings)?))
}

fn openai(settings: ProviderSettings) -> Result<Arc<dyn Provider>, LlmError> {
    Ok(Arc::new(OpenAiProvider::new(settings)?))
}

/// `DeepSeek` speaks the `OpenAI` wire format without JSON-schema output
fn deepseek(settings: ProviderSettings) -> Result<Arc<dyn Provider>, LlmError> {
    Ok(Arc::new(OpenAiProvider::new(settings)?.without_structured_output()))
}

/// Look up a backend by name, ignoring case
pub fn lookup(name: &str) -> Result<&'static BackendSpec, LlmError> {
    BACKENDS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| LlmError::UnsupportedProvider { name: name.to_owned() })
}

/// Names of all registered backends
pub fn backends() -> impl Iterator<Item = &'static str> {
    BACKENDS.iter().map(|spec| spec.name)
}
