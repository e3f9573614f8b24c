//! Ollama provider implementation

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use url::Url;

use super::http::{ByteStream, HttpTransport, join_endpoint};
use super::{Provider, ProviderCapabilities, ProviderSettings};
use crate::convert::ollama::ollama_response_to_chat;
use crate::error::LlmError;
use crate::protocol::ollama::{OllamaRequest, OllamaResponse, OllamaTagList};
use crate::types::{ChatRequest, ChatResponse, ChatStream};

/// Runtime options Ollama accepts under `options`
pub const OLLAMA_OPTIONS: &[&str] = &[
    "temperature",
    "top_k",
    "top_p",
    "min_p",
    "tfs_z",
    "typical_p",
    "repeat_last_n",
    "repeat_penalty",
    "seed",
    "num_predict",
    "stop",
    "num_ctx",
    "num_batch",
    "num_gpu",
    "main_gpu",
    "num_thread",
    "low_vram",
    "f16_kv",
    "vocab_only",
    "use_mmap",
    "use_mlock",
    "num_keep",
    "mirostat",
    "mirostat_eta",
    "mirostat_tau",
    "num_gqa",
];

/// Local Ollama server
pub struct OllamaProvider {
    model: String,
    transport: HttpTransport,
    chat_url: Url,
    tags_url: Url,
}

impl OllamaProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        Ok(Self {
            chat_url: join_endpoint(&settings.endpoint, "api/chat")?,
            tags_url: join_endpoint(&settings.endpoint, "api/tags")?,
            transport: HttpTransport::new(settings.name, settings.timeout, settings.api_key)?,
            model: settings.model,
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        self.transport.backend()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_calling: true,
            structured_output: true,
        }
    }

    fn known_options(&self) -> &'static [&'static str] {
        OLLAMA_OPTIONS
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut wire_request = OllamaRequest::from(request);
        wire_request.stream = false;

        let wire_response: OllamaResponse = self.transport.post_json(self.chat_url.clone(), &wire_request).await?;
        ollama_response_to_chat(self.name(), wire_response)
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        let mut wire_request = OllamaRequest::from(request);
        wire_request.stream = true;

        let body = self.transport.post_stream(self.chat_url.clone(), &wire_request).await?;
        Ok(Box::pin(ndjson_responses(self.name().to_owned(), body)))
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let tags: OllamaTagList = self.transport.get_json(self.tags_url.clone()).await?;
        Ok(tags.models.into_iter().filter_map(|m| m.name).collect())
    }
}

struct LineReader {
    body: ByteStream,
    buffer: Vec<u8>,
    finished: bool,
}

impl LineReader {
    /// Next complete line, or the unterminated tail once the body ends
    async fn next_line(&mut self) -> Option<Result<Vec<u8>, LlmError>> {
        loop {
            if let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=end).collect();
                return Some(Ok(line));
            }

            match self.body.next().await {
                Some(Ok(bytes)) => self.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => return Some(Err(e)),
                None if self.buffer.is_empty() => return None,
                None => return Some(Ok(std::mem::take(&mut self.buffer))),
            }
        }
    }
}

/// Decode a newline-delimited JSON body into partial responses
///
/// The line with `done: true` is the last item. Lines that fail to decode
/// are yielded as errors and reading continues.
fn ndjson_responses(
    backend: String,
    body: ByteStream,
) -> impl futures_util::Stream<Item = Result<ChatResponse, LlmError>> + Send {
    let reader = LineReader {
        body,
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold((reader, backend), |(mut reader, backend)| async move {
        loop {
            if reader.finished {
                return None;
            }

            let line = match reader.next_line().await? {
                Ok(line) => line,
                Err(e) => {
                    reader.finished = true;
                    return Some((Err(e), (reader, backend)));
                }
            };

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let item = match serde_json::from_slice::<OllamaResponse>(&line) {
                Ok(chunk) => {
                    reader.finished = chunk.done || chunk.error.is_some();
                    ollama_response_to_chat(&backend, chunk)
                }
                Err(e) => {
                    tracing::debug!(provider = %backend, error = %e, "undecodable stream line");
                    Err(LlmError::MalformedResponse {
                        backend: backend.clone(),
                        reason: e.to_string(),
                    })
                }
            };

            return Some((item, (reader, backend)));
        }
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::types::FinishReason;

    fn body(chunks: &[&'static str]) -> ByteStream {
        let chunks: Vec<Result<Bytes, LlmError>> = chunks.iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
        stream::iter(chunks).boxed()
    }

    async fn collect(chunks: &[&'static str]) -> Vec<Result<ChatResponse, LlmError>> {
        ndjson_responses("ollama".to_owned(), body(chunks)).collect().await
    }

    #[tokio::test]
    async fn lines_split_across_chunks_are_reassembled() {
        let items = collect(&[
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n{\"message\":{\"role\":\"ass",
            "istant\",\"content\":\"lo\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"done_reason\":\"stop\"}\n",
        ])
        .await;

        let texts: Vec<String> = items.iter().map(|i| i.as_ref().unwrap().text().to_owned()).collect();
        assert_eq!(texts, ["Hel", "lo", ""]);
        assert_eq!(
            items[2].as_ref().unwrap().finish_reason,
            Some(FinishReason::Stop)
        );
    }

    #[tokio::test]
    async fn nothing_is_read_after_done() {
        let items = collect(&[
            "{\"message\":{\"role\":\"assistant\",\"content\":\"a\"},\"done\":true}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"ignored\"},\"done\":false}\n",
        ])
        .await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn unterminated_last_line_is_decoded() {
        let items = collect(&["{\"message\":{\"role\":\"assistant\",\"content\":\"tail\"},\"done\":true}"]).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().text(), "tail");
    }

    #[tokio::test]
    async fn bad_line_is_an_error_item_and_stream_continues() {
        let items = collect(&[
            "not json\n",
            "\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"ok\"},\"done\":true}\n",
        ])
        .await;

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(LlmError::MalformedResponse { .. })));
        assert_eq!(items[1].as_ref().unwrap().text(), "ok");
    }

    #[tokio::test]
    async fn error_line_is_surfaced_and_ends_the_stream() {
        let items = collect(&[
            "{\"message\":{\"role\":\"assistant\",\"content\":\"a\"},\"done\":false}\n",
            "{\"error\":\"model runner has unexpectedly stopped\"}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"ignored\"},\"done\":false}\n",
        ])
        .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text(), "a");
        assert!(
            matches!(&items[1], Err(LlmError::BackendRequest { status: None, cause, .. }) if cause.contains("unexpectedly stopped")),
            "got {:?}",
            items[1]
        );
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"{\"message\":{\"role\":\"assistant\",\"content\":\"a\"},\"done\":false}\n")),
            Err(LlmError::BackendRequest {
                backend: "ollama".to_owned(),
                status: None,
                cause: "reset".to_owned(),
            }),
        ])
        .boxed();

        let items: Vec<_> = ndjson_responses("ollama".to_owned(), failing).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(LlmError::BackendRequest { status: None, .. })));
    }
}
