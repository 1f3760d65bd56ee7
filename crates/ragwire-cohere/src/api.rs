use ragwire_core::RagwireError;
use ragwire_models::{ProviderRequest, ProviderResponse};
use serde_json::Value;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.cohere.com/v2";
pub(crate) const API_KEY_ENV: &str = "COHERE_API_KEY";

/// `COHERE_API_KEY`; unset or empty is a `Config` error.
pub(crate) fn api_key_from_env() -> Result<String, RagwireError> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| RagwireError::Config(format!("{API_KEY_ENV} is not set")))
}

pub(crate) fn request(base_url: &str, path: &str, api_key: &str, body: Value) -> ProviderRequest {
    ProviderRequest {
        url: format!("{}/{path}", base_url.trim_end_matches('/')),
        headers: vec![
            ("Authorization".to_string(), format!("Bearer {api_key}")),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ],
        body,
    }
}

/// Map an error status to `RateLimit` (429) or to the caller's error variant.
pub(crate) fn check_status(
    resp: &ProviderResponse,
    endpoint: &str,
    into_error: fn(String) -> RagwireError,
) -> Result<(), RagwireError> {
    if resp.status < 400 {
        return Ok(());
    }
    let message = match &resp.body {
        Value::String(s) => s.clone(),
        body => body["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
    };
    if resp.status == 429 {
        return Err(RagwireError::RateLimit(message));
    }
    Err(into_error(format!(
        "Cohere {endpoint} API error ({}): {message}",
        resp.status
    )))
}
