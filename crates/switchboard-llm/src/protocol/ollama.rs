//! Ollama `/api/chat` and `/api/tags` wire format types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// -- Request types --

/// Ollama chat request
#[derive(Debug, Clone, Serialize)]
pub struct OllamaRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<OllamaMessage>,
    /// Tool definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OllamaTool>>,
    /// Backend-native runtime options (`temperature`, `num_ctx`, ...)
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    /// JSON schema constraining the reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    /// Whether to stream newline-delimited chunks
    pub stream: bool,
}

/// Message within a request
#[derive(Debug, Clone, Serialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

/// Tool definition, same shape as the canonical one
#[derive(Debug, Clone, Serialize)]
pub struct OllamaTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: OllamaFunction,
}

#[derive(Debug, Clone, Serialize)]
pub struct OllamaFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

// -- Response types --

/// Ollama chat response, also used for each streamed line
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaResponse {
    /// Model that produced the reply
    #[serde(default)]
    pub model: Option<String>,
    /// Generated message (partial when streaming)
    #[serde(default)]
    pub message: Option<OllamaResponseMessage>,
    /// Set on the final chunk
    #[serde(default)]
    pub done: bool,
    /// Why generation stopped (final chunk only)
    #[serde(default)]
    pub done_reason: Option<String>,
    /// Prompt tokens, left raw for coercion
    #[serde(default)]
    pub prompt_eval_count: Option<Value>,
    /// Generated tokens, left raw for coercion
    #[serde(default)]
    pub eval_count: Option<Value>,
    /// Backend failure, sent in place of a reply (also mid-stream with status 200)
    #[serde(default)]
    pub error: Option<Value>,
}

/// Message within a response
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Tool call within a response message
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: OllamaFunctionCall,
}

/// Function name with arguments as an object or a JSON-encoded string
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

// -- Models list types --

/// `/api/tags` response
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaTagList {
    #[serde(default)]
    pub models: Vec<OllamaTag>,
}

/// Locally available model
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaTag {
    #[serde(default)]
    pub name: Option<String>,
}
