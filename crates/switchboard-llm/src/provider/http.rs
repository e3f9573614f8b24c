//! Shared HTTP transport for backend adapters
//!
//! Wraps a `reqwest::Client` with the adapter's deadline and credentials and
//! turns every transport outcome into an `LlmError`, so adapters never leak
//! `reqwest::Error` to callers.

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::LlmError;

/// Raw response body delivered chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Bytes, LlmError>>;

/// HTTP transport bound to one backend
#[derive(Debug, Clone)]
pub struct HttpTransport {
    backend: String,
    client: Client,
    timeout: Duration,
    api_key: Option<SecretString>,
}

impl HttpTransport {
    pub fn new(backend: impl Into<String>, timeout: Duration, api_key: Option<SecretString>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .tcp_nodelay(true)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| LlmError::InvalidConfiguration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            backend: backend.into(),
            client,
            timeout,
            api_key,
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST a JSON body and decode a JSON reply, bounded by the deadline
    pub async fn post_json<B, R>(&self, url: Url, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.authorize(self.client.post(url)).json(body).timeout(self.timeout);
        self.send_and_decode(request).await
    }

    /// GET and decode a JSON reply, bounded by the deadline
    pub async fn get_json<R: DeserializeOwned>(&self, url: Url) -> Result<R, LlmError> {
        let request = self.authorize(self.client.get(url)).timeout(self.timeout);
        self.send_and_decode(request).await
    }

    /// POST a JSON body and hand back the response body as a stream
    ///
    /// The deadline applies to the initial response (including an error body
    /// on non-2xx) and then to each chunk read separately. The stream ends
    /// after a timeout or transport error.
    pub async fn post_stream<B>(&self, url: Url, body: &B) -> Result<ByteStream, LlmError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.authorize(self.client.post(url)).json(body);

        let response = tokio::time::timeout(self.timeout, async {
            let response = request.send().await.map_err(|e| self.transport_error(&e))?;
            self.check_status(response).await
        })
        .await
        .map_err(|_| self.timed_out())??;

        let backend = self.backend.clone();
        let timeout = self.timeout;
        let body = response.bytes_stream().boxed();

        let chunks = stream::unfold(Some(body), move |body| {
            let backend = backend.clone();
            async move {
                let mut body = body?;
                match tokio::time::timeout(timeout, body.next()).await {
                    Err(_) => {
                        tracing::warn!(provider = %backend, "stream chunk timed out");
                        Some((Err(LlmError::BackendTimeout { backend, timeout }), None))
                    }
                    Ok(None) => None,
                    Ok(Some(Ok(bytes))) => Some((Ok(bytes), Some(body))),
                    Ok(Some(Err(e))) => {
                        tracing::error!(provider = %backend, error = %e, "stream read failed");
                        let err = LlmError::BackendRequest {
                            backend,
                            status: None,
                            cause: e.to_string(),
                        };
                        Some((Err(err), None))
                    }
                }
            }
        });

        Ok(chunks.boxed())
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    async fn send_and_decode<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, LlmError> {
        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let response = self.check_status(response).await?;

        let body = response.bytes().await.map_err(|e| self.transport_error(&e))?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!(provider = %self.backend, error = %e, "undecodable response body");
            LlmError::MalformedResponse {
                backend: self.backend.clone(),
                reason: e.to_string(),
            }
        })
    }

    async fn check_status(&self, response: Response) -> Result<Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider = %self.backend, status = %status, "upstream returned error");

        Err(LlmError::BackendRequest {
            backend: self.backend.clone(),
            status: Some(status.as_u16()),
            cause: if body.is_empty() { status.to_string() } else { body },
        })
    }

    fn transport_error(&self, e: &reqwest::Error) -> LlmError {
        if e.is_timeout() {
            return self.timed_out();
        }

        tracing::error!(provider = %self.backend, error = %e, "upstream request failed");
        LlmError::BackendRequest {
            backend: self.backend.clone(),
            status: e.status().map(|s| s.as_u16()),
            cause: e.to_string(),
        }
    }

    fn timed_out(&self) -> LlmError {
        tracing::warn!(provider = %self.backend, timeout = ?self.timeout, "upstream request timed out");
        LlmError::BackendTimeout {
            backend: self.backend.clone(),
            timeout: self.timeout,
        }
    }
}

/// Append `path` to a base endpoint, keeping any base path (`/v1`)
pub fn join_endpoint(base: &Url, path: &str) -> Result<Url, LlmError> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| LlmError::InvalidConfiguration(format!("invalid endpoint `{joined}`: {e}")))
}
