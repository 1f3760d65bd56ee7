use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use ragwire_core::{
    get_buffer_string, AIMessageChunk, ChatModel, ChatRequest, ChatResponse, ChatStream, Message,
    RagwireError,
};
use ragwire_models::{
    HttpBackend, ProviderBackend, ProviderRequest, ProviderResponse, RetryBackend, RetryPolicy,
};
use serde_json::{json, Map, Value};

use crate::{token_from_env, DEFAULT_PROVIDER, ROUTER_URL};

/// A stream of generated text fragments.
pub type TextStream<'a> = Pin<Box<dyn Stream<Item = Result<String, RagwireError>> + Send + 'a>>;

/// Endpoint settings that cannot be passed through `model_kwargs`. `stop` is
/// not one of them: a `stop` kwarg replaces the configured stop sequences.
const RESERVED_KWARGS: &[&str] = &[
    "model",
    "endpoint_url",
    "repo_id",
    "provider",
    "task",
    "huggingfacehub_api_token",
    "inference_server_url",
    "max_new_tokens",
    "top_k",
    "top_p",
    "typical_p",
    "temperature",
    "repetition_penalty",
    "return_full_text",
    "truncate",
    "stop_sequences",
    "seed",
    "do_sample",
    "watermark",
    "timeout",
    "streaming",
    "server_kwargs",
    "model_kwargs",
    "client",
    "async_client",
];

/// Header carrying `server_kwargs.bill_to`.
const BILL_TO_HEADER: &str = "X-HF-Bill-To";

/// Settings for a Hugging Face text-generation endpoint.
///
/// Exactly one of `model`, `endpoint_url` or `repo_id` may be set. When none is,
/// `HF_INFERENCE_ENDPOINT` is used.
#[derive(Debug, Clone)]
pub struct HuggingFaceEndpointConfig {
    /// A Hub model id or a full endpoint URL.
    pub model: Option<String>,
    pub endpoint_url: Option<String>,
    pub repo_id: Option<String>,
    /// Inference provider serving a Hub model id (default: `hf-inference`).
    /// Ignored when the target is a full URL.
    pub provider: Option<String>,
    /// Falls back to `HUGGINGFACEHUB_API_TOKEN`, then `HF_TOKEN`.
    pub api_token: Option<String>,
    /// Router that Hub model ids are resolved against.
    pub router_url: String,
    pub max_new_tokens: u32,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub typical_p: Option<f64>,
    pub temperature: Option<f64>,
    pub repetition_penalty: Option<f64>,
    /// Prepend the prompt to the generated text.
    pub return_full_text: bool,
    /// Truncate input tokens to this size.
    pub truncate: Option<u32>,
    pub stop_sequences: Vec<String>,
    pub seed: Option<u64>,
    pub do_sample: bool,
    pub watermark: bool,
    pub timeout: Duration,
    /// Generate through the streaming API even for non-streaming calls.
    pub streaming: bool,
    /// Extra generation parameters sent as-is.
    pub model_kwargs: Map<String, Value>,
    /// Client options. `headers` (an object of strings) and `bill_to` are sent
    /// as request headers; other keys are ignored with a warning.
    pub server_kwargs: Map<String, Value>,
}

impl Default for HuggingFaceEndpointConfig {
    fn default() -> Self {
        Self {
            model: None,
            endpoint_url: None,
            repo_id: None,
            provider: None,
            api_token: None,
            router_url: ROUTER_URL.to_string(),
            max_new_tokens: 512,
            top_k: None,
            top_p: Some(0.95),
            typical_p: Some(0.95),
            temperature: Some(0.8),
            repetition_penalty: None,
            return_full_text: false,
            truncate: None,
            stop_sequences: Vec::new(),
            seed: None,
            do_sample: false,
            watermark: false,
            timeout: Duration::from_secs(120),
            streaming: false,
            model_kwargs: Map::new(),
            server_kwargs: Map::new(),
        }
    }
}

impl HuggingFaceEndpointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_repo_id(mut self, repo_id: impl Into<String>) -> Self {
        self.repo_id = Some(repo_id.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_router_url(mut self, router_url: impl Into<String>) -> Self {
        self.router_url = router_url.into();
        self
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_typical_p(mut self, typical_p: f64) -> Self {
        self.typical_p = Some(typical_p);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_repetition_penalty(mut self, penalty: f64) -> Self {
        self.repetition_penalty = Some(penalty);
        self
    }

    pub fn with_return_full_text(mut self, return_full_text: bool) -> Self {
        self.return_full_text = return_full_text;
        self
    }

    pub fn with_truncate(mut self, truncate: u32) -> Self {
        self.truncate = Some(truncate);
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = stop;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_do_sample(mut self, do_sample: bool) -> Self {
        self.do_sample = do_sample;
        self
    }

    pub fn with_watermark(mut self, watermark: bool) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_model_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.model_kwargs.insert(key.into(), value);
        self
    }

    pub fn with_server_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.server_kwargs.insert(key.into(), value);
        self
    }

    /// Request headers derived from `server_kwargs`.
    fn server_headers(&self) -> Result<Vec<(String, String)>, RagwireError> {
        let mut headers = Vec::new();
        let mut ignored = Vec::new();
        for (key, value) in &self.server_kwargs {
            match key.as_str() {
                "headers" => {
                    let map = value.as_object().ok_or_else(|| {
                        RagwireError::Config("server_kwargs.headers must be an object".to_string())
                    })?;
                    for (name, value) in map {
                        let value = value.as_str().ok_or_else(|| {
                            RagwireError::Config(format!(
                                "server_kwargs header {name:?} must be a string"
                            ))
                        })?;
                        headers.push((name.clone(), value.to_string()));
                    }
                }
                "bill_to" => {
                    let value = value.as_str().ok_or_else(|| {
                        RagwireError::Config("server_kwargs.bill_to must be a string".to_string())
                    })?;
                    headers.push((BILL_TO_HEADER.to_string(), value.to_string()));
                }
                other => ignored.push(other),
            }
        }
        if !ignored.is_empty() {
            tracing::warn!(?ignored, "ignoring server_kwargs the HTTP client does not support");
        }
        Ok(headers)
    }

    fn check_model_kwargs(&self) -> Result<(), RagwireError> {
        let mut reserved: Vec<&str> = self
            .model_kwargs
            .keys()
            .map(String::as_str)
            .filter(|k| RESERVED_KWARGS.contains(k))
            .collect();
        if reserved.is_empty() {
            return Ok(());
        }
        reserved.sort_unstable();
        Err(RagwireError::Config(format!(
            "parameters {reserved:?} should be set explicitly, not through model_kwargs"
        )))
    }

    /// Pick the target URL from the configured model, endpoint URL or repo id,
    /// falling back to `env_endpoint`. Hub model ids resolve to
    /// `{router_url}/{provider}/models/{id}`.
    fn resolve_url(&self, env_endpoint: Option<String>) -> Result<String, RagwireError> {
        let set: Vec<&String> = [&self.model, &self.endpoint_url, &self.repo_id]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if set.len() > 1 {
            return Err(RagwireError::Config(
                "specify either a model, an endpoint_url or a repo_id, not more than one"
                    .to_string(),
            ));
        }
        let target = set
            .first()
            .map(|s| s.to_string())
            .or(env_endpoint.filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                RagwireError::Config(
                    "specify a model, an endpoint_url or a repo_id, or set HF_INFERENCE_ENDPOINT"
                        .to_string(),
                )
            })?;

        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(target);
        }
        let provider = self
            .provider
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROVIDER);
        Ok(format!(
            "{}/{provider}/models/{target}",
            self.router_url.trim_end_matches('/')
        ))
    }
}

/// Client for a Hugging Face text-generation endpoint.
pub struct HuggingFaceEndpoint {
    config: HuggingFaceEndpointConfig,
    url: String,
    token: Option<String>,
    extra_headers: Vec<(String, String)>,
    backend: Arc<dyn ProviderBackend>,
}

impl HuggingFaceEndpoint {
    pub fn new(
        config: HuggingFaceEndpointConfig,
        backend: Arc<dyn ProviderBackend>,
    ) -> Result<Self, RagwireError> {
        config.check_model_kwargs()?;
        let extra_headers = config.server_headers()?;
        let url = config.resolve_url(std::env::var("HF_INFERENCE_ENDPOINT").ok())?;
        let token = config.api_token.clone().or_else(token_from_env);
        if token.is_none() {
            tracing::warn!(url = %url, "no Hugging Face token configured, sending unauthenticated requests");
        }
        Ok(Self {
            config,
            url,
            token,
            extra_headers,
            backend,
        })
    }

    /// Build an endpoint over HTTP using the configured timeout. Rate-limited
    /// and timed-out requests are retried.
    pub fn connect(config: HuggingFaceEndpointConfig) -> Result<Self, RagwireError> {
        let http = HttpBackend::with_timeout(config.timeout)?;
        let backend = RetryBackend::new(Arc::new(http), RetryPolicy::default());
        Self::new(config, Arc::new(backend))
    }

    pub fn config(&self) -> &HuggingFaceEndpointConfig {
        &self.config
    }

    /// The resolved URL requests are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Generation parameters for one call. `stop` is the configured stop
    /// sequences (or a `stop` model kwarg) followed by `runtime_stop`. Unset
    /// optional values are omitted.
    pub fn invocation_params(&self, runtime_stop: &[String]) -> Map<String, Value> {
        let c = &self.config;
        let mut params = Map::new();
        params.insert("max_new_tokens".into(), json!(c.max_new_tokens));
        params.insert("stop".into(), json!(c.stop_sequences));
        let optional = [
            ("top_k", c.top_k.map(|v| json!(v))),
            ("top_p", c.top_p.map(|v| json!(v))),
            ("typical_p", c.typical_p.map(|v| json!(v))),
            ("temperature", c.temperature.map(|v| json!(v))),
            ("repetition_penalty", c.repetition_penalty.map(|v| json!(v))),
            ("truncate", c.truncate.map(|v| json!(v))),
            ("seed", c.seed.map(|v| json!(v))),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.insert(key.into(), value);
            }
        }
        params.insert("return_full_text".into(), json!(c.return_full_text));
        params.insert("do_sample".into(), json!(c.do_sample));
        params.insert("watermark".into(), json!(c.watermark));
        for (key, value) in &c.model_kwargs {
            params.insert(key.clone(), value.clone());
        }
        let mut stop = match params.remove("stop") {
            Some(Value::Array(items)) => items,
            Some(Value::String(single)) => vec![Value::String(single)],
            _ => Vec::new(),
        };
        stop.extend(runtime_stop.iter().map(|s| Value::String(s.clone())));
        params.insert("stop".into(), Value::Array(stop));
        params
    }

    /// Generate a completion for `prompt`.
    ///
    /// A stop sequence the model ended on is removed from the returned text.
    pub async fn generate(&self, prompt: &str, stop: &[String]) -> Result<String, RagwireError> {
        let params = self.invocation_params(stop);
        self.generate_with(prompt, params).await
    }

    /// Stream a completion for `prompt`, ending before the first stop sequence.
    pub fn stream(&self, prompt: &str, stop: &[String]) -> TextStream<'_> {
        let params = self.invocation_params(stop);
        self.stream_with(prompt.to_string(), params)
    }

    fn request(&self, prompt: &str, params: Map<String, Value>, stream: bool) -> ProviderRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers.extend(self.extra_headers.iter().cloned());
        ProviderRequest {
            url: self.url.clone(),
            headers,
            body: json!({
                "inputs": prompt,
                "parameters": Value::Object(params),
                "stream": stream,
            }),
        }
    }

    async fn generate_with(
        &self,
        prompt: &str,
        params: Map<String, Value>,
    ) -> Result<String, RagwireError> {
        tracing::debug!(url = %self.url, streaming = self.config.streaming, "Hugging Face generation");
        if self.config.streaming {
            let mut completion = String::new();
            let mut stream = self.stream_with(prompt.to_string(), params);
            while let Some(text) = stream.next().await {
                completion.push_str(&text?);
            }
            return Ok(completion);
        }

        let stops = stop_list(&params);
        let resp = self.backend.send(self.request(prompt, params, false)).await?;
        check_status(&resp)?;
        let text = parse_generated_text(&resp.body)?;
        Ok(strip_stop_suffixes(text, &stops))
    }

    fn stream_with(&self, prompt: String, params: Map<String, Value>) -> TextStream<'_> {
        Box::pin(async_stream::stream! {
            let stops = stop_list(&params);
            let request = self.request(&prompt, params, true);
            let byte_stream = match self.backend.send_stream(request).await {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            use eventsource_stream::Eventsource;

            let mut events = byte_stream
                .map(|result| result.map_err(|e| std::io::Error::other(e.to_string())))
                .eventsource();

            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(ev) => ev,
                    Err(e) => {
                        yield Err(RagwireError::Model(format!("SSE parse error: {e}")));
                        break;
                    }
                };
                if event.data.trim().is_empty() {
                    continue;
                }
                let value: Value = match serde_json::from_str(&event.data) {
                    Ok(v) => v,
                    Err(e) => {
                        yield Err(RagwireError::Parsing(format!("Hugging Face stream event: {e}")));
                        break;
                    }
                };
                if let Some(message) = value.get("error").and_then(Value::as_str) {
                    yield Err(RagwireError::Model(format!("Hugging Face stream error: {message}")));
                    break;
                }
                if value["token"]["special"].as_bool() == Some(true) {
                    continue;
                }
                let token = value["token"]["text"].as_str().unwrap_or_default();
                let (text, stopped) = cut_at_stop(token, &stops);
                if !text.is_empty() {
                    yield Ok(text.to_string());
                }
                if stopped {
                    break;
                }
            }
        })
    }

    fn chat_params(&self, request: &ChatRequest) -> Map<String, Value> {
        let mut params = self.invocation_params(&request.stop);
        if let Some(temperature) = request.temperature {
            params.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            params.insert("max_new_tokens".into(), json!(max_tokens));
        }
        params
    }
}

fn render_prompt(messages: &[Message]) -> String {
    get_buffer_string(messages, "Human", "AI")
}

fn stop_list(params: &Map<String, Value>) -> Vec<String> {
    params
        .get("stop")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn check_status(resp: &ProviderResponse) -> Result<(), RagwireError> {
    if resp.status < 400 {
        return Ok(());
    }
    let message = match &resp.body {
        Value::String(s) => s.clone(),
        body => body["error"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
    };
    if resp.status == 429 {
        return Err(RagwireError::RateLimit(message));
    }
    Err(RagwireError::Model(format!(
        "Hugging Face API error ({}): {message}",
        resp.status
    )))
}

/// Accepts both `[{"generated_text": ...}]` and `{"generated_text": ...}`.
fn parse_generated_text(body: &Value) -> Result<String, RagwireError> {
    static NULL: Value = Value::Null;
    let item = match body {
        Value::Array(items) => items.first().unwrap_or(&NULL),
        other => other,
    };
    item["generated_text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            RagwireError::Parsing(format!("missing generated_text in response: {body}"))
        })
}

fn strip_stop_suffixes(mut text: String, stops: &[String]) -> String {
    for stop in stops {
        if !stop.is_empty() && text.ends_with(stop.as_str()) {
            text.truncate(text.len() - stop.len());
        }
    }
    text
}

/// Text before the earliest stop sequence in `token`, and whether one was found.
fn cut_at_stop<'a>(token: &'a str, stops: &[String]) -> (&'a str, bool) {
    stops
        .iter()
        .filter_map(|stop| token.find(stop.as_str()))
        .min()
        .map(|idx| (&token[..idx], true))
        .unwrap_or((token, false))
}

#[async_trait]
impl ChatModel for HuggingFaceEndpoint {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, RagwireError> {
        let params = self.chat_params(&request);
        let text = self
            .generate_with(&render_prompt(&request.messages), params)
            .await?;
        Ok(ChatResponse {
            message: Message::ai(text),
            usage: None,
        })
    }

    fn stream_chat(&self, request: ChatRequest) -> ChatStream<'_> {
        let params = self.chat_params(&request);
        let prompt = render_prompt(&request.messages);
        Box::pin(
            self.stream_with(prompt, params)
                .map(|item| item.map(|content| AIMessageChunk { content, usage: None })),
        )
    }
}
