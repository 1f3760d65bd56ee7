use std::{collections::VecDeque, pin::Pin, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::Stream;
use ragwire_core::RagwireError;
use serde_json::Value;
use tokio::sync::Mutex;

/// An outgoing JSON POST to a provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ProviderRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A provider reply. Bodies that are not JSON arrive as `Value::String`.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: Value,
}

impl ProviderResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes, RagwireError>> + Send>>;

#[async_trait]
pub trait ProviderBackend: Send + Sync {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, RagwireError>;
    async fn send_stream(&self, request: ProviderRequest) -> Result<ByteStream, RagwireError>;
}

/// Production backend using reqwest.
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build a backend whose requests fail with `RagwireError::Timeout` after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, RagwireError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagwireError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &ProviderRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        builder.json(&request.body)
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> RagwireError {
    if e.is_timeout() {
        RagwireError::Timeout(format!("HTTP request timed out: {e}"))
    } else {
        RagwireError::Model(format!("HTTP request failed: {e}"))
    }
}

#[async_trait]
impl ProviderBackend for HttpBackend {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, RagwireError> {
        tracing::debug!(url = %request.url, "sending provider request");
        let response = self.build(&request).send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        tracing::debug!(url = %request.url, status, "provider responded");

        Ok(ProviderResponse { status, body })
    }

    async fn send_stream(&self, request: ProviderRequest) -> Result<ByteStream, RagwireError> {
        use futures::StreamExt;

        tracing::debug!(url = %request.url, "opening provider stream");
        let response = self.build(&request).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(if code == 429 {
                RagwireError::RateLimit(text)
            } else {
                RagwireError::Model(format!("stream request failed ({code}): {text}"))
            });
        }

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(|e| RagwireError::Model(format!("stream error: {e}"))));

        Ok(Box::pin(stream))
    }
}

/// Test backend with queued responses and stream chunks. Every request is recorded.
pub struct FakeBackend {
    responses: Arc<Mutex<VecDeque<Result<ProviderResponse, RagwireError>>>>,
    stream_chunks: Arc<Mutex<VecDeque<Vec<bytes::Bytes>>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            stream_chunks: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_response(&self, response: ProviderResponse) -> &Self {
        self.responses
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Ok(response));
        self
    }

    pub fn push_error(&self, error: RagwireError) -> &Self {
        self.responses
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Err(error));
        self
    }

    pub fn push_stream_chunks(&self, chunks: Vec<bytes::Bytes>) -> &Self {
        self.stream_chunks
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(chunks);
        self
    }

    /// All requests sent so far, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderBackend for FakeBackend {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, RagwireError> {
        self.requests.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        responses
            .pop_front()
            .unwrap_or_else(|| Err(RagwireError::Model("FakeBackend exhausted".to_string())))
    }

    async fn send_stream(&self, request: ProviderRequest) -> Result<ByteStream, RagwireError> {
        self.requests.lock().await.push(request);
        let mut stream_chunks = self.stream_chunks.lock().await;
        let chunks = stream_chunks.pop_front().unwrap_or_default();

        let stream = futures::stream::iter(chunks.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }
}
