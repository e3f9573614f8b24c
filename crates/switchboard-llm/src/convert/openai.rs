//! Conversion between canonical types and the `OpenAI` wire format

use std::collections::BTreeMap;

use serde_json::Value;

use super::{backend_error, non_empty, parse_role, parse_usage, tool_call};
use crate::error::LlmError;
use crate::protocol::openai::{
    OpenAiFunction, OpenAiJsonSchema, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiResponseFormat,
    OpenAiStreamChunk, OpenAiTool, OpenAiUsage,
};
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, FinishReason, ResponseFormat, ToolCall, ToolDefinition, Usage,
};

// -- Outbound: canonical types -> OpenAI wire format --

impl From<&ChatRequest> for OpenAiRequest {
    fn from(req: &ChatRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            tools: req.tools.as_ref().map(|tools| tools.iter().map(Into::into).collect()),
            response_format: req.response_format.as_ref().map(Into::into),
            stream: req.stream.then_some(true),
            stream_options: None,
            options: req.options.clone(),
        }
    }
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: tool.tool_type.clone(),
            function: OpenAiFunction {
                name: tool.function.name.clone(),
                description: tool.function.description.clone(),
                parameters: tool.function.parameters.clone(),
            },
        }
    }
}

impl From<&ResponseFormat> for OpenAiResponseFormat {
    fn from(format: &ResponseFormat) -> Self {
        Self {
            format_type: "json_schema".to_owned(),
            json_schema: OpenAiJsonSchema {
                name: format.name.clone(),
                schema: format.schema.clone(),
                strict: format.strict,
            },
        }
    }
}

// -- Inbound: OpenAI wire format -> canonical types --

fn usage(backend: &str, usage: Option<&OpenAiUsage>) -> Result<Option<Usage>, LlmError> {
    match usage {
        Some(u) => parse_usage(
            backend,
            u.prompt_tokens.as_ref(),
            u.completion_tokens.as_ref(),
            u.total_tokens.as_ref(),
        ),
        None => Ok(None),
    }
}

/// Map a non-streaming response, taking the first choice
pub fn openai_response_to_chat(backend: &str, resp: OpenAiResponse) -> Result<ChatResponse, LlmError> {
    if let Some(error) = &resp.error {
        return Err(backend_error(backend, error));
    }

    let usage = usage(backend, resp.usage.as_ref())?;

    let Some(choice) = resp.choices.into_iter().next() else {
        return Err(LlmError::MalformedResponse {
            backend: backend.to_owned(),
            reason: "response contained no choices".to_owned(),
        });
    };

    let role = parse_role(backend, &choice.message.role)?;
    let calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| tool_call(tc.id, tc.function.name, &tc.function.arguments))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ChatResponse {
        id: resp.id,
        model: resp.model,
        message: Some(ChatMessage::new(role, choice.message.content.unwrap_or_default())),
        tool_calls: non_empty(calls),
        usage,
        finish_reason: choice.finish_reason.map(FinishReason::from),
    })
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Reassembles tool calls whose arguments arrive split across chunks
///
/// Fragments are keyed by their index in the `tool_calls` array. The decoded
/// calls are released on the chunk carrying the finish reason, or by
/// [`finish`](Self::finish) when the stream ends without one.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, PartialToolCall>,
}

impl ToolCallAccumulator {
    /// Map one streamed chunk into the items it produces, in order
    ///
    /// A chunk that only carried fragments produces nothing. When the pending
    /// calls fail to decode on the finish chunk, that chunk is still reported
    /// and the decode error follows it.
    pub fn push(&mut self, backend: &str, chunk: OpenAiStreamChunk) -> Vec<Result<ChatResponse, LlmError>> {
        if let Some(error) = &chunk.error {
            return vec![Err(backend_error(backend, error))];
        }

        let usage = match usage(backend, chunk.usage.as_ref()) {
            Ok(usage) => usage,
            Err(e) => return vec![Err(e)],
        };
        let mut response = ChatResponse {
            id: chunk.id,
            model: chunk.model,
            usage,
            ..ChatResponse::default()
        };
        let mut failure = None;

        if let Some(choice) = chunk.choices.into_iter().next() {
            let delta = choice.delta;

            for fragment in delta.tool_calls.unwrap_or_default() {
                let partial = self.calls.entry(fragment.index).or_default();
                if fragment.id.is_some() {
                    partial.id = fragment.id;
                }
                if let Some(function) = fragment.function {
                    if let Some(name) = function.name {
                        partial.name.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        partial.arguments.push_str(&arguments);
                    }
                }
            }

            if delta.role.is_some() || delta.content.is_some() {
                let role = match delta.role.as_deref().map(|role| parse_role(backend, role)) {
                    Some(Ok(role)) => role,
                    Some(Err(e)) => return vec![Err(e)],
                    None => ChatRole::Assistant,
                };
                response.message = Some(ChatMessage::new(role, delta.content.unwrap_or_default()));
            }

            if let Some(reason) = choice.finish_reason {
                response.finish_reason = Some(FinishReason::from(reason));
                match self.drain() {
                    Ok(calls) => response.tool_calls = calls,
                    Err(e) => failure = Some(e),
                }
            }
        }

        let empty = response.message.is_none()
            && response.finish_reason.is_none()
            && response.usage.is_none()
            && response.tool_calls.is_none();

        let mut items = Vec::with_capacity(2);
        if !empty {
            items.push(Ok(response));
        }
        items.extend(failure.map(Err));
        items
    }

    /// Release calls still pending when the stream ended without a finish reason
    pub fn finish(&mut self) -> Option<Result<ChatResponse, LlmError>> {
        match self.drain() {
            Ok(None) => None,
            Ok(Some(calls)) => Some(Ok(ChatResponse {
                tool_calls: Some(calls),
                ..ChatResponse::default()
            })),
            Err(e) => Some(Err(e)),
        }
    }

    fn drain(&mut self) -> Result<Option<Vec<ToolCall>>, LlmError> {
        let calls = std::mem::take(&mut self.calls)
            .into_values()
            .map(|partial| tool_call(partial.id, partial.name, &Value::String(partial.arguments)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(non_empty(calls))
    }
}
