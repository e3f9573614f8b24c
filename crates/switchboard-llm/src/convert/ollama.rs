//! Conversion between canonical types and the Ollama wire format

use super::{backend_error, non_empty, parse_role, parse_usage, tool_call};
use crate::error::LlmError;
use crate::protocol::ollama::{OllamaFunction, OllamaMessage, OllamaRequest, OllamaResponse, OllamaTool};
use crate::types::{ChatMessage, ChatRequest, ChatResponse, FinishReason, ToolDefinition};

// -- Outbound: canonical types -> Ollama wire format --

impl From<&ChatRequest> for OllamaRequest {
    fn from(req: &ChatRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            tools: req.tools.as_ref().map(|tools| tools.iter().map(Into::into).collect()),
            options: req.options.clone(),
            format: req.response_format.as_ref().map(|f| f.schema.clone()),
            stream: req.stream,
        }
    }
}

impl From<&ChatMessage> for OllamaMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

impl From<&ToolDefinition> for OllamaTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: tool.tool_type.clone(),
            function: OllamaFunction {
                name: tool.function.name.clone(),
                description: tool.function.description.clone(),
                parameters: tool.function.parameters.clone(),
            },
        }
    }
}

// -- Inbound: Ollama wire format -> canonical types --

/// Map a chat response (or one streamed line) to a canonical response
///
/// A body carrying `error` is a backend failure, even with status 200.
pub fn ollama_response_to_chat(backend: &str, resp: OllamaResponse) -> Result<ChatResponse, LlmError> {
    if let Some(error) = &resp.error {
        return Err(backend_error(backend, error));
    }

    let usage = parse_usage(backend, resp.prompt_eval_count.as_ref(), resp.eval_count.as_ref(), None)?;

    let (message, tool_calls) = match resp.message {
        Some(msg) => {
            let role = parse_role(backend, &msg.role)?;
            let calls = msg
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| tool_call(tc.id, tc.function.name, &tc.function.arguments))
                .collect::<Result<Vec<_>, _>>()?;
            (Some(ChatMessage::new(role, msg.content)), non_empty(calls))
        }
        None => (None, None),
    };

    Ok(ChatResponse {
        id: None,
        model: resp.model,
        message,
        tool_calls,
        usage,
        finish_reason: resp.done_reason.map(FinishReason::from),
    })
}
