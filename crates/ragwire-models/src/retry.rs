use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ragwire_core::RagwireError;

use crate::backend::{ByteStream, ProviderBackend, ProviderRequest, ProviderResponse};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: usize) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt as u32)
    }

    fn has_next(&self, attempt: usize) -> bool {
        attempt + 1 < self.max_attempts
    }
}

/// Wraps a backend and retries rate-limited or timed-out requests with
/// exponential backoff.
///
/// A `429` response counts as rate limited. When attempts run out the last
/// response or error is returned unchanged, so clients still map it to
/// `RagwireError::RateLimit`.
pub struct RetryBackend {
    inner: Arc<dyn ProviderBackend>,
    policy: RetryPolicy,
}

impl RetryBackend {
    pub fn new(inner: Arc<dyn ProviderBackend>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

fn is_retryable(err: &RagwireError) -> bool {
    matches!(err, RagwireError::RateLimit(_) | RagwireError::Timeout(_))
}

#[async_trait]
impl ProviderBackend for RetryBackend {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, RagwireError> {
        let mut attempt = 0;
        loop {
            let result = self.inner.send(request.clone()).await;
            let retry = match &result {
                Ok(resp) => resp.status == 429,
                Err(e) => is_retryable(e),
            };
            if !retry || !self.policy.has_next(attempt) {
                return result;
            }
            let delay = self.policy.delay(attempt);
            match &result {
                Ok(resp) => {
                    tracing::warn!(url = %request.url, attempt, ?delay, status = resp.status, "retrying provider request")
                }
                Err(e) => {
                    tracing::warn!(url = %request.url, attempt, ?delay, error = %e, "retrying provider request")
                }
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Only opening the stream is retried; errors after the first chunk pass through.
    async fn send_stream(&self, request: ProviderRequest) -> Result<ByteStream, RagwireError> {
        let mut attempt = 0;
        loop {
            match self.inner.send_stream(request.clone()).await {
                Err(e) if is_retryable(&e) && self.policy.has_next(attempt) => {
                    let delay = self.policy.delay(attempt);
                    tracing::warn!(url = %request.url, attempt, ?delay, error = %e, "retrying provider stream");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
