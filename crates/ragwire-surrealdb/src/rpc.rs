use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine;
use ragwire_core::RagwireError;
use ragwire_models::{ProviderBackend, ProviderRequest, ProviderResponse};
use serde_json::{json, Map, Value};

use crate::config::{SurrealAuth, SurrealConfig};

/// Minimal client for the `query` method of SurrealDB's HTTP RPC endpoint.
pub(crate) struct SurrealRpc {
    url: String,
    headers: Vec<(String, String)>,
    backend: Arc<dyn ProviderBackend>,
    next_id: AtomicU64,
}

impl SurrealRpc {
    pub(crate) fn new(config: &SurrealConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("surreal-ns".to_string(), config.namespace.clone()),
            ("surreal-db".to_string(), config.database.clone()),
        ];
        match &config.auth {
            SurrealAuth::None => {}
            SurrealAuth::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                headers.push(("Authorization".to_string(), format!("Basic {encoded}")));
            }
            SurrealAuth::Bearer(token) => {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }
        Self {
            url: config.rpc_url(),
            headers,
            backend,
            next_id: AtomicU64::new(1),
        }
    }

    /// Run one or more `;`-separated statements and return each statement's result.
    pub(crate) async fn query(
        &self,
        sql: &str,
        vars: Map<String, Value>,
    ) -> Result<Vec<Value>, RagwireError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = ProviderRequest {
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: json!({
                "id": id,
                "method": "query",
                "params": [sql, Value::Object(vars)],
            }),
        };
        tracing::debug!(rpc_id = id, sql, "SurrealDB query");
        let response = self.backend.send(request).await?;
        parse_query_response(response)
    }
}

fn parse_query_response(response: ProviderResponse) -> Result<Vec<Value>, RagwireError> {
    let ProviderResponse { status, body } = response;

    if status == 429 {
        return Err(RagwireError::RateLimit(error_text(&body)));
    }
    if status == 401 || status == 403 {
        return Err(RagwireError::VectorStore(format!(
            "SurrealDB authentication failed (HTTP {status}): {}",
            error_text(&body)
        )));
    }
    if let Some(err) = body.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown RPC error");
        return Err(RagwireError::VectorStore(format!(
            "SurrealDB RPC error: {message}"
        )));
    }
    if status >= 400 {
        return Err(RagwireError::VectorStore(format!(
            "SurrealDB error (HTTP {status}): {}",
            error_text(&body)
        )));
    }

    let statements = body
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RagwireError::Parsing("SurrealDB response missing result array".to_string())
        })?;

    statements
        .iter()
        .enumerate()
        .map(|(i, stmt)| {
            let status = stmt.get("status").and_then(Value::as_str).unwrap_or("OK");
            let result = stmt.get("result").cloned().unwrap_or(Value::Null);
            if status == "OK" {
                Ok(result)
            } else {
                let message = match result {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Err(RagwireError::VectorStore(format!(
                    "SurrealDB statement {i} failed: {message}"
                )))
            }
        })
        .collect()
}

fn error_text(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other
            .get("information")
            .or_else(|| other.get("details"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

/// Extract the key part of a record id, e.g. `documents:⟨a-b⟩` -> `a-b`.
///
/// Accepts the string form as well as the `{ "tb": ..., "id": ... }` object form.
pub(crate) fn parse_record_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let key = s.split_once(':').map(|(_, key)| key).unwrap_or(s);
            Some(unquote(key).to_string())
        }
        Value::Object(obj) => match obj.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        },
        _ => None,
    }
}

fn unquote(key: &str) -> &str {
    key.strip_prefix('⟨')
        .and_then(|k| k.strip_suffix('⟩'))
        .or_else(|| key.strip_prefix('`').and_then(|k| k.strip_suffix('`')))
        .unwrap_or(key)
}
