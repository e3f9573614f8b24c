use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::ChatMessage;
use super::tool::ToolCall;

/// Reason the model stopped generating
///
/// Backend values outside the common set are carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    /// Natural end of generation
    Stop,
    /// Hit the token limit
    Length,
    /// Backend reported a generation error
    Error,
    /// Model decided to call a tool
    ToolCalls,
    /// End of the model's turn
    EndTurn,
    /// Backend-specific reason
    Other(String),
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::Error => "error",
            Self::ToolCalls => "tool_calls",
            Self::EndTurn => "end_turn",
            Self::Other(reason) => reason,
        }
    }
}

impl From<&str> for FinishReason {
    fn from(s: &str) -> Self {
        match s {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "error" => Self::Error,
            "tool_calls" => Self::ToolCalls,
            "end_turn" => Self::EndTurn,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for FinishReason {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        match reason {
            FinishReason::Other(reason) => reason,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    /// Tokens generated in the completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    /// Total tokens (prompt + completion)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl Usage {
    /// Build usage from raw wire counts, coercing each to an integer
    ///
    /// Returns `Ok(None)` when the backend reported no counts at all. A missing
    /// total is derived from the two parts when both are present.
    pub fn from_wire(
        prompt: Option<&Value>,
        completion: Option<&Value>,
        total: Option<&Value>,
    ) -> Result<Option<Self>, String> {
        let prompt_tokens = prompt.map(coerce_token_count).transpose()?.flatten();
        let completion_tokens = completion.map(coerce_token_count).transpose()?.flatten();
        let total_tokens = total.map(coerce_token_count).transpose()?.flatten();

        if prompt_tokens.is_none() && completion_tokens.is_none() && total_tokens.is_none() {
            return Ok(None);
        }

        let total_tokens = total_tokens.or_else(|| match (prompt_tokens, completion_tokens) {
            (Some(p), Some(c)) => p.checked_add(c),
            _ => None,
        });

        Ok(Some(Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }))
    }
}

/// Coerce a wire token count into a non-negative integer
///
/// Accepts integers, integer-valued floats and decimal strings; `null` means
/// "not reported".
pub fn coerce_token_count(value: &Value) -> Result<Option<u64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(Some(v));
            }
            n.as_f64()
                .and_then(whole_float_to_u64)
                .map(Some)
                .ok_or_else(|| format!("token count must be a non-negative integer, got {n}"))
        }
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("token count must be an integer, got \"{s}\"")),
        other => Err(format!("token count must be an integer, got {other}")),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn whole_float_to_u64(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then(|| f as u64)
}

/// Canonical chat completion response, identical in shape for every backend
///
/// In streaming mode each item of the stream is a partial `ChatResponse`
/// carrying only the fields present in that chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response identifier, when the backend assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Model that produced the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Generated message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    /// Tool calls requested by the model; `None` when there are none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Why generation stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl ChatResponse {
    /// Text content of the message, or an empty string
    pub fn text(&self) -> &str {
        self.message.as_ref().map_or("", |m| m.content.as_str())
    }
}
