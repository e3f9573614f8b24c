use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while resolving a backend or running a chat
#[derive(Debug, Error)]
pub enum LlmError {
    /// Backend name is not in the registry
    #[error("unsupported provider: {name}")]
    UnsupportedProvider { name: String },

    /// No API key in the environment or the credential store
    #[error("missing API key for {backend}: set `{env_var}` or add it to the credential store")]
    MissingCredential { backend: String, env_var: String },

    /// Credential store could not be read and no environment value exists
    #[error("credential store {} unavailable: {reason}", .path.display())]
    CredentialStoreUnavailable { path: PathBuf, reason: String },

    /// A transcript entry is neither text, a message object, nor a message
    #[error("invalid message type at position {index}: expected string or message object, got {kind}")]
    InvalidMessageType { index: usize, kind: &'static str },

    /// A message object does not match the message shape
    #[error("invalid message at position {index}: {reason}")]
    InvalidMessageShape { index: usize, reason: String },

    /// Tool-call arguments could not be decoded into an object
    #[error("invalid arguments for tool call `{function}`: {reason}")]
    InvalidToolArguments { function: String, reason: String },

    /// The backend cannot honor a requested feature
    #[error("{backend} does not support {feature}")]
    UnsupportedFeature { backend: String, feature: &'static str },

    /// Non-2xx status or transport failure
    #[error("{backend} request failed{}: {cause}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    BackendRequest {
        backend: String,
        status: Option<u16>,
        cause: String,
    },

    /// The backend did not answer within the configured deadline
    #[error("{backend} request timed out after {}s", .timeout.as_secs_f64())]
    BackendTimeout { backend: String, timeout: Duration },

    /// A successful response body could not be mapped to the canonical model
    #[error("malformed response from {backend}: {reason}")]
    MalformedResponse { backend: String, reason: String },

    /// Client settings are invalid (e.g. an unparseable endpoint)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl LlmError {
    /// Whether retrying the same call may succeed
    ///
    /// No retries happen inside this crate; callers apply their own policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BackendTimeout { .. } => true,
            Self::BackendRequest { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            _ => false,
        }
    }
}
