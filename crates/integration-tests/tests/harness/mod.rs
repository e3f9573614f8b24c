//! Mock backends speaking the Ollama and `OpenAI` wire formats
//!
//! Each mock binds `127.0.0.1:0`, records every request it receives and
//! answers with whatever [`Reply`] it was started with. Dropping the mock
//! shuts its server down.

#![allow(dead_code)]

pub mod mock_ollama;
pub mod mock_openai;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::stream;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// How the mock answers chat requests
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with a JSON body
    Json(Value),
    /// 200 with a body written chunk by chunk, pausing before each chunk
    Stream { chunks: Vec<String>, delay: Duration },
    /// Error status with a raw body
    Status(StatusCode, String),
    /// Wait before answering with a JSON body
    Delayed(Duration, Value),
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct MockState {
    reply: Reply,
    models: Value,
    content_type: &'static str,
    requests: Mutex<Vec<RecordedRequest>>,
    chunks_sent: AtomicUsize,
    body_dropped: AtomicBool,
}

impl MockState {
    fn new(reply: Reply, models: Value, content_type: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply,
            models,
            content_type,
            requests: Mutex::new(Vec::new()),
            chunks_sent: AtomicUsize::new(0),
            body_dropped: AtomicBool::new(false),
        })
    }

    fn record(&self, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest { authorization, body });
    }
}

/// Handle shared by both mocks
pub struct MockServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockServer {
    async fn start(app: Router, state: Arc<MockState>) -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Body of the most recent request
    pub fn last_body(&self) -> Value {
        self.requests().pop().map(|r| r.body).unwrap_or(Value::Null)
    }

    /// Number of streamed chunks written to the connection
    pub fn chunks_sent(&self) -> usize {
        self.state.chunks_sent.load(Ordering::SeqCst)
    }

    /// Whether the streamed body has been released by the server
    pub fn body_dropped(&self) -> bool {
        self.state.body_dropped.load(Ordering::SeqCst)
    }

    /// Wait up to `limit` for the streamed body to be released
    pub async fn wait_for_body_drop(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.body_dropped() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.body_dropped()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Sets the dropped flag when the response body goes away
struct DropGuard(Arc<MockState>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.body_dropped.store(true, Ordering::SeqCst);
    }
}

async fn chat_reply(state: Arc<MockState>, headers: HeaderMap, body: Value) -> Response {
    state.record(&headers, body);

    match state.reply.clone() {
        Reply::Json(value) => axum::Json(value).into_response(),
        Reply::Delayed(delay, value) => {
            tokio::time::sleep(delay).await;
            axum::Json(value).into_response()
        }
        Reply::Status(status, body) => (status, body).into_response(),
        Reply::Stream { chunks, delay } => {
            let content_type = state.content_type;
            let guard = DropGuard(Arc::clone(&state));

            let body = stream::unfold((chunks.into_iter(), guard), move |(mut chunks, guard)| async move {
                let chunk = chunks.next()?;
                tokio::time::sleep(delay).await;
                guard.0.chunks_sent.fetch_add(1, Ordering::SeqCst);
                Some((Ok::<_, Infallible>(Bytes::from(chunk)), (chunks, guard)))
            });

            ([(header::CONTENT_TYPE, content_type)], Body::from_stream(body)).into_response()
        }
    }
}

async fn models_reply(state: Arc<MockState>) -> Response {
    axum::Json(state.models.clone()).into_response()
}
