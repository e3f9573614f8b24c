//! Mock OpenAI-compatible server: `POST /v1/chat/completions` and `GET /v1/models`

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use url::Url;

use super::{MockServer, MockState, Reply, chat_reply, models_reply};

pub struct MockOpenAi(MockServer);

impl MockOpenAi {
    /// Start with a plain assistant reply and two models
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Reply::Json(completion("Hello from mock LLM"))).await
    }

    pub async fn start_with(reply: Reply) -> anyhow::Result<Self> {
        let state = MockState::new(
            reply,
            json!({
                "object": "list",
                "data": [
                    {"id": "mock-model-1", "object": "model", "created": 1_700_000_000, "owned_by": "mock"},
                    {"id": "mock-model-2", "object": "model", "created": 1_700_000_000, "owned_by": "mock"},
                ],
            }),
            "text/event-stream",
        );

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/models", routing::get(handle_models))
            .with_state(Arc::clone(&state));

        MockServer::start(app, state).await.map(Self)
    }

    /// Base URL including `/v1`, as the adapter appends `chat/completions`
    pub fn endpoint(&self) -> Url {
        Url::parse(&format!("http://{}/v1", self.addr())).unwrap()
    }
}

impl Deref for MockOpenAi {
    type Target = MockServer;

    fn deref(&self) -> &MockServer {
        &self.0
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    chat_reply(state, headers, body).await
}

async fn handle_models(State(state): State<Arc<MockState>>) -> axum::response::Response {
    models_reply(state).await
}

/// Complete chat completion body with a text reply
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test-123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "mock-model-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop",
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15},
    })
}

/// Complete chat completion body calling one tool with raw `arguments`
pub fn tool_call_completion(name: &str, arguments: &str) -> Value {
    json!({
        "id": "chatcmpl-test-456",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "mock-model-1",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_test_123",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments},
                }],
            },
            "finish_reason": "tool_calls",
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 8, "total_tokens": 28},
    })
}

/// One SSE event carrying `data`
pub fn sse_event(data: &Value) -> String {
    format!("data: {data}\n\n")
}

/// Streamed reply: a role chunk, one chunk per part, a finish chunk, `[DONE]`
pub fn streamed(parts: &[&str], delay: Duration) -> Reply {
    let chunk = |delta: Value, finish_reason: Value| {
        sse_event(&json!({
            "id": "chatcmpl-test-stream",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": "mock-model-1",
            "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}],
        }))
    };

    let mut chunks = vec![chunk(json!({"role": "assistant", "content": ""}), Value::Null)];
    chunks.extend(parts.iter().map(|p| chunk(json!({"content": p}), Value::Null)));
    chunks.push(chunk(json!({}), json!("stop")));
    chunks.push("data: [DONE]\n\n".to_owned());

    Reply::Stream { chunks, delay }
}
