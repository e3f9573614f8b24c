use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Role of a message participant
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    /// End-user turn
    User,
    /// Model reply
    Assistant,
    /// System instruction
    System,
    /// Tool/function result
    Tool,
    /// Developer instruction
    Developer,
    /// Code review persona
    Codereviewer,
}

/// Canonical message in a conversation transcript
///
/// Unknown fields are rejected when deserializing so that caller typos
/// (`"contnet"`, `"roles"`) surface as shape errors instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    /// Role of the message author
    pub role: ChatRole,
    /// Message text, possibly empty
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Tool, content)
    }
}

/// Loosely typed caller input for a single transcript entry
///
/// Normalized into a [`ChatMessage`] by [`crate::normalize::normalize_messages`].
#[derive(Debug, Clone, PartialEq)]
pub enum MessageInput {
    /// Bare text, promoted to a user message
    Text(String),
    /// Untyped JSON, validated against the message shape
    Raw(serde_json::Value),
    /// Already canonical
    Message(ChatMessage),
}

impl From<&str> for MessageInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for MessageInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ChatMessage> for MessageInput {
    fn from(message: ChatMessage) -> Self {
        Self::Message(message)
    }
}

impl From<serde_json::Value> for MessageInput {
    fn from(value: serde_json::Value) -> Self {
        Self::Raw(value)
    }
}
