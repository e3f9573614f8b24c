//! Provider trait and implementations for LLM backends

pub mod http;
pub mod ollama;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value};
use url::Url;

use crate::error::LlmError;
use crate::normalize::normalize_messages;
use crate::options::classify_options;
use crate::types::{ChatParams, ChatReply, ChatRequest, ChatResponse, ChatStream};

/// Capabilities advertised by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Whether the provider supports streaming responses
    pub streaming: bool,
    /// Whether the provider supports tool/function calling
    pub tool_calling: bool,
    /// Whether the provider can constrain replies to a JSON schema
    pub structured_output: bool,
}

/// Settings an adapter is constructed from
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Registry name the adapter is serving (e.g. `deepseek` on the `OpenAI` adapter)
    pub name: String,
    /// Default model for calls that do not override it
    pub model: String,
    /// Base URL of the backend API
    pub endpoint: Url,
    /// Per-request deadline
    pub timeout: Duration,
    /// Bearer credential, if the backend takes one
    pub api_key: Option<SecretString>,
}

/// A request ready to send, plus the options that were not forwarded
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChat {
    pub request: ChatRequest,
    pub unrecognized_options: Map<String, Value>,
}

/// Trait implemented by each LLM backend adapter
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name of the backend
    fn name(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities;

    /// Backend-native option keys that are forwarded
    fn known_options(&self) -> &'static [&'static str];

    /// Model used when a call does not name one
    fn default_model(&self) -> &str;

    /// Send a non-streaming chat request
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Send a streaming chat request
    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError>;

    /// Names of the models the backend serves
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    /// Assemble the canonical request without touching the network
    fn prepare(&self, params: ChatParams) -> Result<PreparedChat, LlmError> {
        let capabilities = self.capabilities();
        let unsupported = |feature| LlmError::UnsupportedFeature {
            backend: self.name().to_owned(),
            feature,
        };

        if params.response_format.is_some() && !capabilities.structured_output {
            return Err(unsupported("structured output"));
        }
        if params.tools.is_some() && !capabilities.tool_calling {
            return Err(unsupported("tool calling"));
        }
        if params.stream && !capabilities.streaming {
            return Err(unsupported("streaming"));
        }

        let messages = normalize_messages(params.messages)?;
        let options = classify_options(self.known_options(), params.options);

        Ok(PreparedChat {
            request: ChatRequest {
                model: params.model.unwrap_or_else(|| self.default_model().to_owned()),
                messages,
                tools: params.tools,
                options: options.known,
                response_format: params.response_format,
                stream: params.stream,
            },
            unrecognized_options: options.unknown,
        })
    }

    /// Prepare and send a chat, streamed or not as the params ask
    async fn chat(&self, params: ChatParams) -> Result<ChatReply, LlmError> {
        let prepared = self.prepare(params)?;

        if !prepared.unrecognized_options.is_empty() {
            let keys: Vec<&str> = prepared.unrecognized_options.keys().map(String::as_str).collect();
            tracing::warn!(
                provider = %self.name(),
                options = ?keys,
                "ignoring options the backend does not recognize"
            );
        }

        let request = prepared.request;
        tracing::debug!(
            provider = %self.name(),
            model = %request.model,
            messages = request.messages.len(),
            stream = request.stream,
            "dispatching chat request"
        );

        if request.stream {
            self.complete_stream(&request).await.map(ChatReply::Stream)
        } else {
            self.complete(&request).await.map(ChatReply::Complete)
        }
    }
}
