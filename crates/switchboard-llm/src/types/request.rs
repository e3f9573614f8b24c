use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use super::message::{ChatMessage, MessageInput};
use super::tool::ToolDefinition;

/// Structured output descriptor: the reply must match a JSON schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    /// Schema name, used by backends that label schemas
    pub name: String,
    /// JSON Schema object
    pub schema: Value,
    /// Whether the backend should enforce the schema strictly
    pub strict: bool,
}

impl ResponseFormat {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }

    /// Derive the schema from a Rust type
    pub fn for_type<T: JsonSchema>() -> Self {
        let schema = schemars::schema_for!(T);
        Self::new(T::schema_name(), schema.to_value())
    }

    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Caller-facing chat input, loosely typed
///
/// Messages may be plain text, raw JSON or canonical messages; `options` is an
/// open map of tuning parameters split against the backend allow-list when the
/// request is prepared.
#[derive(Debug, Clone, Default)]
pub struct ChatParams {
    pub messages: Vec<MessageInput>,
    pub model: Option<String>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub response_format: Option<ResponseFormat>,
    pub stream: bool,
    pub options: Map<String, Value>,
}

impl ChatParams {
    pub fn new<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MessageInput>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Override the client's model for this call
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    #[must_use]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    #[must_use]
    pub const fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Add a tuning option such as `temperature` or `seed`
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Canonical request assembled from [`ChatParams`] before any network call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Resolved model identifier
    pub model: String,
    /// Normalized transcript, in caller order
    pub messages: Vec<ChatMessage>,
    /// Tool definitions available to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Backend-recognized options only
    pub options: Map<String, Value>,
    /// Structured output descriptor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    /// Whether to stream the response
    pub stream: bool,
}
