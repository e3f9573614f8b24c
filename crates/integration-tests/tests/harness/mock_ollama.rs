//! Mock Ollama server: `POST /api/chat` and `GET /api/tags`

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use url::Url;

use super::{MockServer, MockState, Reply, chat_reply, models_reply};

pub struct MockOllama(MockServer);

impl MockOllama {
    /// Start with a plain assistant reply and two installed models
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Reply::Json(chat_response("Hello from mock Ollama", "stop"))).await
    }

    pub async fn start_with(reply: Reply) -> anyhow::Result<Self> {
        Self::start_with_models(reply, json!({"models": [{"name": "llama3:latest"}, {"name": "qwen2:7b"}]})).await
    }

    pub async fn start_with_models(reply: Reply, models: Value) -> anyhow::Result<Self> {
        let state = MockState::new(reply, models, "application/x-ndjson");

        let app = Router::new()
            .route("/api/chat", routing::post(handle_chat))
            .route("/api/tags", routing::get(handle_tags))
            .with_state(Arc::clone(&state));

        MockServer::start(app, state).await.map(Self)
    }

    /// Base URL to configure the client with
    pub fn endpoint(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr())).unwrap()
    }
}

impl Deref for MockOllama {
    type Target = MockServer;

    fn deref(&self) -> &MockServer {
        &self.0
    }
}

async fn handle_chat(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> axum::response::Response {
    chat_reply(state, headers, body).await
}

async fn handle_tags(State(state): State<Arc<MockState>>) -> axum::response::Response {
    models_reply(state).await
}

/// Complete (non-streamed) `/api/chat` body
pub fn chat_response(content: &str, done_reason: &str) -> Value {
    json!({
        "model": "llama3",
        "created_at": "2024-07-01T12:00:00.000000Z",
        "message": {"role": "assistant", "content": content},
        "done": true,
        "done_reason": done_reason,
        "total_duration": 5_000_000,
        "prompt_eval_count": 26,
        "eval_count": 12,
    })
}

/// One newline-terminated stream line
pub fn stream_line(content: &str, done: bool) -> String {
    let mut line = json!({
        "model": "llama3",
        "created_at": "2024-07-01T12:00:00.000000Z",
        "message": {"role": "assistant", "content": content},
        "done": done,
    });
    if done {
        line["done_reason"] = json!("stop");
        line["prompt_eval_count"] = json!(26);
        line["eval_count"] = json!(3);
    }
    format!("{line}\n")
}

/// Streamed reply made of `parts` followed by the done line
pub fn streamed(parts: &[&str], delay: Duration) -> Reply {
    let mut chunks: Vec<String> = parts.iter().map(|p| stream_line(p, false)).collect();
    chunks.push(stream_line("", true));
    Reply::Stream { chunks, delay }
}
