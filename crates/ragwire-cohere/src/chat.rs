use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::{
    AIMessageChunk, ChatModel, ChatRequest, ChatResponse, ChatStream, Message, RagwireError,
    TokenUsage,
};
use ragwire_models::{ProviderBackend, ProviderRequest, ProviderResponse};
use serde_json::{json, Value};

use crate::api;

#[derive(Debug, Clone)]
pub struct CohereChatConfig {
    pub api_key: String,
    /// Model name (default: `"command-r-plus-08-2024"`).
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl CohereChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "command-r-plus-08-2024".to_string(),
            base_url: api::DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_env() -> Result<Self, RagwireError> {
        Ok(Self::new(api::api_key_from_env()?))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Chat model over Cohere's v2 `/chat` endpoint.
pub struct CohereChatModel {
    config: CohereChatConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl CohereChatModel {
    pub fn new(config: CohereChatConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self { config, backend }
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> ProviderRequest {
        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            stream,
            "Cohere chat request"
        );
        let messages: Vec<Value> = request.messages.iter().map(message_to_cohere).collect();
        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": stream,
        });

        if let Some(temp) = request.temperature.or(self.config.temperature) {
            body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = request.max_tokens.or(self.config.max_tokens) {
            body["max_tokens"] = json!(max_tokens);
        }
        if !request.stop.is_empty() {
            body["stop_sequences"] = json!(request.stop);
        }

        api::request(&self.config.base_url, "chat", &self.config.api_key, body)
    }
}

fn message_to_cohere(msg: &Message) -> Value {
    let role = match msg {
        Message::System { .. } => "system",
        Message::Human { .. } => "user",
        Message::AI { .. } => "assistant",
    };
    json!({ "role": role, "content": msg.content() })
}

fn parse_usage(usage: &Value) -> Option<TokenUsage> {
    let counts = if usage["tokens"].is_object() {
        &usage["tokens"]
    } else if usage["billed_units"].is_object() {
        &usage["billed_units"]
    } else {
        return None;
    };
    Some(TokenUsage::new(
        counts["input_tokens"].as_u64().unwrap_or(0) as u32,
        counts["output_tokens"].as_u64().unwrap_or(0) as u32,
    ))
}

fn parse_response(resp: &ProviderResponse) -> Result<ChatResponse, RagwireError> {
    api::check_status(resp, "chat", RagwireError::Model)?;

    let content: String = resp.body["message"]["content"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    let mut message = Message::ai(content);
    if let Some(id) = resp.body["id"].as_str() {
        message = message.with_id(id);
    }
    if let Some(reason) = resp.body.get("finish_reason") {
        message = message.with_response_metadata_entry("finish_reason", reason.clone());
    }

    Ok(ChatResponse {
        message,
        usage: parse_usage(&resp.body["usage"]),
    })
}

enum StreamEvent {
    Chunk(AIMessageChunk),
    End(AIMessageChunk),
    Skip,
}

fn parse_stream_event(data: &str) -> Result<StreamEvent, RagwireError> {
    let v: Value = serde_json::from_str(data)
        .map_err(|e| RagwireError::Parsing(format!("Cohere stream event: {e}")))?;
    match v["type"].as_str() {
        Some("content-delta") => {
            let text = v["delta"]["message"]["content"]["text"]
                .as_str()
                .unwrap_or_default();
            Ok(StreamEvent::Chunk(AIMessageChunk {
                content: text.to_string(),
                usage: None,
            }))
        }
        Some("message-end") => Ok(StreamEvent::End(AIMessageChunk {
            content: String::new(),
            usage: parse_usage(&v["delta"]["usage"]),
        })),
        _ => Ok(StreamEvent::Skip),
    }
}

#[async_trait]
impl ChatModel for CohereChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, RagwireError> {
        let provider_req = self.build_request(&request, false);
        let resp = self.backend.send(provider_req).await?;
        parse_response(&resp)
    }

    fn stream_chat(&self, request: ChatRequest) -> ChatStream<'_> {
        Box::pin(async_stream::stream! {
            let provider_req = self.build_request(&request, true);
            let byte_stream = match self.backend.send_stream(provider_req).await {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            use eventsource_stream::Eventsource;
            use futures::StreamExt;

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
                match parse_stream_event(&event.data) {
                    Ok(StreamEvent::Chunk(chunk)) => {
                        if !chunk.content.is_empty() {
                            yield Ok(chunk);
                        }
                    }
                    Ok(StreamEvent::End(chunk)) => {
                        if chunk.usage.is_some() {
                            yield Ok(chunk);
                        }
                        break;
                    }
                    Ok(StreamEvent::Skip) => {}
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_cohere_names() {
        assert_eq!(message_to_cohere(&Message::system("s"))["role"], "system");
        assert_eq!(message_to_cohere(&Message::human("h"))["role"], "user");
        assert_eq!(message_to_cohere(&Message::ai("a"))["role"], "assistant");
    }

    #[test]
    fn usage_falls_back_to_billed_units() {
        let usage = parse_usage(&json!({"billed_units": {"input_tokens": 3, "output_tokens": 4}}))
            .unwrap();
        assert_eq!(usage.total_tokens, 7);
        assert!(parse_usage(&Value::Null).is_none());
    }

    #[test]
    fn unknown_events_are_skipped() {
        assert!(matches!(
            parse_stream_event(r#"{"type":"message-start","id":"x"}"#).unwrap(),
            StreamEvent::Skip
        ));
        assert!(parse_stream_event("not json").is_err());
    }
}
