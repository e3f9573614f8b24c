//! Conversion between canonical types and backend wire formats
//!
//! Outbound conversions (canonical request to wire) are infallible `From`
//! impls. Inbound conversions validate what the backend sent and return
//! `LlmError` naming the backend when something does not fit.

pub mod ollama;
pub mod openai;

use serde_json::{Map, Value};

use crate::error::LlmError;
use crate::types::{ChatRole, FunctionCall, ToolCall, Usage};

/// Decode tool-call arguments into an object
///
/// Backends send either an object or a JSON-encoded string. An empty string
/// or `null` is an empty object; anything that does not end up as an object
/// is an error.
pub fn decode_tool_arguments(function: &str, raw: &Value) -> Result<Map<String, Value>, LlmError> {
    let invalid = |reason: String| LlmError::InvalidToolArguments {
        function: function.to_owned(),
        reason,
    };

    match raw {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Map::new()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(invalid(format!("expected a JSON object, got {other}"))),
            Err(e) => Err(invalid(e.to_string())),
        },
        other => Err(invalid(format!("expected a JSON object, got {other}"))),
    }
}

/// Build a canonical tool call, decoding its arguments
pub(crate) fn tool_call(id: Option<String>, name: String, arguments: &Value) -> Result<ToolCall, LlmError> {
    let arguments = decode_tool_arguments(&name, arguments)?;
    Ok(ToolCall {
        id,
        function: FunctionCall { name, arguments },
    })
}

/// An empty list of tool calls is reported as none
pub(crate) fn non_empty(calls: Vec<ToolCall>) -> Option<Vec<ToolCall>> {
    (!calls.is_empty()).then_some(calls)
}

pub(crate) fn parse_role(backend: &str, role: &str) -> Result<ChatRole, LlmError> {
    role.parse().map_err(|_| LlmError::MalformedResponse {
        backend: backend.to_owned(),
        reason: format!("unknown message role `{role}`"),
    })
}

/// Error reported inside a successful HTTP response body
///
/// Ollama sends `{"error": "text"}`; `OpenAI`-compatible servers send
/// `{"error": {"message": "text", ...}}`.
pub(crate) fn backend_error(backend: &str, error: &Value) -> LlmError {
    let cause = match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_owned),
        other => other.to_string(),
    };

    tracing::warn!(provider = %backend, cause = %cause, "backend reported an error in the response body");
    LlmError::BackendRequest {
        backend: backend.to_owned(),
        status: None,
        cause,
    }
}

pub(crate) fn parse_usage(
    backend: &str,
    prompt: Option<&Value>,
    completion: Option<&Value>,
    total: Option<&Value>,
) -> Result<Option<Usage>, LlmError> {
    Usage::from_wire(prompt, completion, total).map_err(|reason| LlmError::MalformedResponse {
        backend: backend.to_owned(),
        reason,
    })
}
