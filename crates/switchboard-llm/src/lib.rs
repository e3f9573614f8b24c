//! Provider-agnostic chat completion for Switchboard
//!
//! Provides one chat interface over several LLM backends (Ollama and
//! `OpenAI`-compatible APIs): loosely typed caller input is normalized into a
//! canonical request, sent through a backend adapter, and the backend's reply
//! is mapped back into one canonical response shape.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod client;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod normalize;
pub mod options;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod types;

pub use client::{Client, ClientBuilder};
pub use credentials::CredentialResolver;
pub use error::LlmError;
pub use normalize::normalize_messages;
pub use options::{ClassifiedOptions, classify_options};
pub use provider::{PreparedChat, Provider, ProviderCapabilities, ProviderSettings};
pub use types::{
    ChatMessage, ChatParams, ChatReply, ChatRequest, ChatResponse, ChatRole, ChatStream, FinishReason, MessageInput,
    ResponseFormat, ToolCall, ToolDefinition, Usage,
};
