//! Conversion of heterogeneous caller input into canonical messages

use serde_json::Value;

use crate::error::LlmError;
use crate::types::{ChatMessage, MessageInput};

/// Normalize a transcript into canonical messages, preserving order
///
/// Text becomes a user message, JSON objects are validated against the
/// message shape (unknown fields rejected) and canonical messages pass
/// through unchanged. Fails on the first invalid entry, naming its position.
pub fn normalize_messages<I>(inputs: I) -> Result<Vec<ChatMessage>, LlmError>
where
    I: IntoIterator<Item = MessageInput>,
{
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| normalize_one(index, input))
        .collect()
}

fn normalize_one(index: usize, input: MessageInput) -> Result<ChatMessage, LlmError> {
    match input {
        MessageInput::Text(text) | MessageInput::Raw(Value::String(text)) => Ok(ChatMessage::user(text)),
        MessageInput::Message(message) => Ok(message),
        MessageInput::Raw(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(|e| LlmError::InvalidMessageShape {
                index,
                reason: e.to_string(),
            })
        }
        MessageInput::Raw(other) => Err(LlmError::InvalidMessageType {
            index,
            kind: json_kind(&other),
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
