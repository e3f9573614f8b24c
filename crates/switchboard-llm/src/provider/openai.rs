//! OpenAI-compatible provider implementation

use std::collections::VecDeque;

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::{StreamExt, stream};
use url::Url;

use super::http::{ByteStream, HttpTransport, join_endpoint};
use super::{Provider, ProviderCapabilities, ProviderSettings};
use crate::convert::openai::{ToolCallAccumulator, openai_response_to_chat};
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiModelList, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk, OpenAiStreamOptions};
use crate::types::{ChatRequest, ChatResponse, ChatStream};

/// Top-level request fields forwarded from caller options
pub const OPENAI_OPTIONS: &[&str] = &[
    "temperature",
    "top_p",
    "max_tokens",
    "max_completion_tokens",
    "stop",
    "frequency_penalty",
    "presence_penalty",
    "seed",
    "logit_bias",
    "logprobs",
    "top_logprobs",
    "user",
    "parallel_tool_calls",
    "tool_choice",
    "reasoning_effort",
];

/// Whether the endpoint is the canonical `OpenAI` API (vs a compatible third-party)
fn is_canonical_openai(endpoint: &Url) -> bool {
    endpoint.host_str().is_some_and(|h| h == "api.openai.com")
}

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    model: String,
    transport: HttpTransport,
    completions_url: Url,
    models_url: Url,
    include_usage: bool,
    structured_output: bool,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        Ok(Self {
            completions_url: join_endpoint(&settings.endpoint, "chat/completions")?,
            models_url: join_endpoint(&settings.endpoint, "models")?,
            include_usage: is_canonical_openai(&settings.endpoint),
            structured_output: true,
            transport: HttpTransport::new(settings.name, settings.timeout, settings.api_key)?,
            model: settings.model,
        })
    }

    /// For compatible servers that reject `response_format: json_schema`
    #[must_use]
    pub const fn without_structured_output(mut self) -> Self {
        self.structured_output = false;
        self
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        self.transport.backend()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_calling: true,
            structured_output: self.structured_output,
        }
    }

    fn known_options(&self) -> &'static [&'static str] {
        OPENAI_OPTIONS
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut wire_request = OpenAiRequest::from(request);
        wire_request.stream = None;

        let wire_response: OpenAiResponse = self
            .transport
            .post_json(self.completions_url.clone(), &wire_request)
            .await?;
        openai_response_to_chat(self.name(), wire_response)
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        let mut wire_request = OpenAiRequest::from(request);
        wire_request.stream = Some(true);

        // Many compatible APIs reject the unsupported parameter
        wire_request.stream_options = self
            .include_usage
            .then_some(OpenAiStreamOptions { include_usage: true });

        let body = self
            .transport
            .post_stream(self.completions_url.clone(), &wire_request)
            .await?;
        Ok(Box::pin(sse_responses(self.name().to_owned(), body)))
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let list: OpenAiModelList = self.transport.get_json(self.models_url.clone()).await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

struct SseState<S> {
    events: S,
    acc: ToolCallAccumulator,
    backend: String,
    pending: VecDeque<Result<ChatResponse, LlmError>>,
    finished: bool,
}

impl<S> SseState<S> {
    /// Stop reading and release any tool calls still being assembled
    fn end(&mut self) {
        self.finished = true;
        self.pending.extend(self.acc.finish());
    }
}

/// Decode a server-sent event body into partial responses, ending at `[DONE]`
///
/// An `error` event or a transport failure is yielded and ends the stream;
/// an undecodable event is yielded and reading continues.
fn sse_responses(
    backend: String,
    body: ByteStream,
) -> impl futures_util::Stream<Item = Result<ChatResponse, LlmError>> + Send {
    let state = SseState {
        events: body.eventsource(),
        acc: ToolCallAccumulator::default(),
        backend,
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            let event = match state.events.next().await {
                Some(Ok(event)) => event,
                Some(Err(EventStreamError::Transport(e))) => {
                    state.finished = true;
                    state.pending.push_back(Err(e));
                    continue;
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(LlmError::MalformedResponse {
                        backend: state.backend.clone(),
                        reason: e.to_string(),
                    }));
                    continue;
                }
                None => {
                    state.end();
                    continue;
                }
            };

            let data = event.data.trim();
            if data == "[DONE]" {
                state.end();
                continue;
            }
            if data.is_empty() {
                continue;
            }

            match serde_json::from_str::<OpenAiStreamChunk>(data) {
                Ok(chunk) => {
                    if chunk.error.is_some() {
                        state.finished = true;
                    }
                    let items = state.acc.push(&state.backend, chunk);
                    state.pending.extend(items);
                }
                Err(e) => {
                    tracing::debug!(provider = %state.backend, error = %e, data = %data, "unparseable SSE chunk");
                    state.pending.push_back(Err(LlmError::MalformedResponse {
                        backend: state.backend.clone(),
                        reason: e.to_string(),
                    }));
                }
            }
        }
    })
}
