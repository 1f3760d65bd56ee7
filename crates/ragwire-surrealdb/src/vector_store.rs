use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::{Document, Embeddings, RagwireError, VectorStore};
use ragwire_models::{HttpBackend, ProviderBackend, RetryBackend, RetryPolicy};
use serde_json::{json, Map, Value};

use crate::config::SurrealConfig;
use crate::filter::MetadataFilter;
use crate::rpc::{parse_record_id, SurrealRpc};

/// SurrealDB-backed vector store.
///
/// Records live in the configured table as `{ text, embedding, metadata }`.
/// Documents that carry an id are written with `UPSERT`, so adding a document
/// twice under the same id replaces it. Documents without an id get a
/// server-generated one.
///
/// Scores come straight from SurrealDB: cosine similarity for
/// [`Distance::Cosine`](crate::Distance::Cosine) (higher is closer), raw
/// distance for the other metrics (lower is closer).
pub struct SurrealVectorStore {
    config: SurrealConfig,
    rpc: SurrealRpc,
}

impl SurrealVectorStore {
    /// Create a store that talks to SurrealDB through `backend`.
    pub fn new(
        config: SurrealConfig,
        backend: Arc<dyn ProviderBackend>,
    ) -> Result<Self, RagwireError> {
        config.validate()?;
        let rpc = SurrealRpc::new(&config, backend);
        Ok(Self { config, rpc })
    }

    /// Create a store using the default HTTP backend.
    /// Connect over HTTP, retrying rate-limited and timed-out queries.
    pub fn connect(config: SurrealConfig) -> Result<Self, RagwireError> {
        let backend = RetryBackend::new(Arc::new(HttpBackend::new()), RetryPolicy::default());
        Self::new(config, Arc::new(backend))
    }

    pub fn config(&self) -> &SurrealConfig {
        &self.config
    }

    /// Define the MTREE index on `embedding` if it does not exist yet.
    pub async fn ensure_index(&self) -> Result<(), RagwireError> {
        let dimension = self.config.dimension.ok_or_else(|| {
            RagwireError::Config("ensure_index requires an embedding dimension".to_string())
        })?;
        let table = &self.config.table;
        let sql = format!(
            "DEFINE INDEX IF NOT EXISTS {table}_embedding_idx ON TABLE {table} \
             FIELDS embedding MTREE DIMENSION {dimension} DIST {};",
            self.config.distance.index_keyword()
        );
        self.rpc.query(&sql, Map::new()).await?;
        tracing::debug!(table = %table, dimension, "SurrealDB index ensured");
        Ok(())
    }

    /// Drop the table and everything in it.
    pub async fn delete_table(&self) -> Result<(), RagwireError> {
        let sql = format!("REMOVE TABLE IF EXISTS {};", self.config.table);
        self.rpc.query(&sql, Map::new()).await?;
        Ok(())
    }

    /// Similarity search restricted to documents whose metadata matches `filter`.
    pub async fn similarity_search_with_filter(
        &self,
        query: &str,
        k: usize,
        filter: &MetadataFilter,
        embeddings: &dyn Embeddings,
    ) -> Result<Vec<(Document, f32)>, RagwireError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = embeddings.embed_query(query).await?;
        self.search(&vector, k, filter).await
    }

    fn base_vars(&self) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert("tb".to_string(), Value::String(self.config.table.clone()));
        vars
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), RagwireError> {
        match self.config.dimension {
            Some(expected) if expected != vector.len() => Err(RagwireError::Validation(format!(
                "expected embedding of dimension {expected}, got {}",
                vector.len()
            ))),
            _ => Ok(()),
        }
    }

    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<(Document, f32)>, RagwireError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(vector)?;

        let mut vars = self.base_vars();
        let where_clause = filter.render(&mut vars)?;
        vars.insert("vector".to_string(), json!(vector));
        vars.insert("k".to_string(), json!(k));

        let distance = self.config.distance;
        let order = if distance.higher_is_closer() { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT id, text, metadata, {}(embedding, $vector) AS score \
             FROM type::table($tb){where_clause} ORDER BY score {order} LIMIT $k;",
            distance.score_function()
        );

        let results = self.rpc.query(&sql, vars).await?;
        let rows = results
            .first()
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let hits = rows
            .iter()
            .map(|row| {
                let score = row.get("score").and_then(Value::as_f64).ok_or_else(|| {
                    RagwireError::Parsing(format!("SurrealDB search row has no numeric score: {row}"))
                })?;
                Ok((row_to_document(row), score as f32))
            })
            .collect::<Result<Vec<(Document, f32)>, RagwireError>>()?;
        tracing::debug!(k, hits = hits.len(), filtered = !filter.is_empty(), "SurrealDB search");
        Ok(hits)
    }
}

fn row_to_document(row: &Value) -> Document {
    let id = row.get("id").and_then(parse_record_id).unwrap_or_default();
    let content = row
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let metadata: HashMap<String, Value> = match row.get("metadata") {
        Some(Value::Object(map)) => map.clone().into_iter().collect(),
        _ => HashMap::new(),
    };
    Document::with_metadata(id, content, metadata)
}

#[async_trait]
impl VectorStore for SurrealVectorStore {
    async fn add_documents(
        &self,
        docs: Vec<Document>,
        embeddings: &dyn Embeddings,
    ) -> Result<Vec<String>, RagwireError> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        let vectors = embeddings.embed_documents(&texts).await?;
        if vectors.len() != docs.len() {
            return Err(RagwireError::Embedding(format!(
                "expected {} embeddings, got {}",
                docs.len(),
                vectors.len()
            )));
        }

        let mut vars = self.base_vars();
        let mut sql = String::new();
        for (i, (doc, vector)) in docs.iter().zip(vectors).enumerate() {
            self.check_dimension(&vector)?;
            vars.insert(
                format!("content{i}"),
                json!({
                    "text": doc.content,
                    "embedding": vector,
                    "metadata": doc.metadata,
                }),
            );
            if doc.has_id() {
                vars.insert(format!("id{i}"), Value::String(doc.id.clone()));
                sql.push_str(&format!(
                    "UPSERT type::thing($tb, $id{i}) CONTENT $content{i} RETURN id;\n"
                ));
            } else {
                sql.push_str(&format!(
                    "CREATE type::table($tb) CONTENT $content{i} RETURN id;\n"
                ));
            }
        }

        let results = self.rpc.query(&sql, vars).await?;
        if results.len() != docs.len() {
            return Err(RagwireError::Parsing(format!(
                "expected {} statement results from SurrealDB, got {}",
                docs.len(),
                results.len()
            )));
        }

        let mut ids = Vec::with_capacity(docs.len());
        for (doc, result) in docs.iter().zip(&results) {
            let returned = match result {
                Value::Array(rows) => rows.first().and_then(|r| r.get("id")),
                other => other.get("id"),
            }
            .and_then(parse_record_id);

            match returned {
                Some(id) => ids.push(id),
                None if doc.has_id() => ids.push(doc.id.clone()),
                None => {
                    return Err(RagwireError::Parsing(
                        "SurrealDB did not return an id for a created record".to_string(),
                    ))
                }
            }
        }

        tracing::debug!(table = %self.config.table, count = ids.len(), "added documents to SurrealDB");
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        embeddings: &dyn Embeddings,
    ) -> Result<Vec<Document>, RagwireError> {
        let hits = self.similarity_search_with_score(query, k, embeddings).await?;
        Ok(hits.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        embeddings: &dyn Embeddings,
    ) -> Result<Vec<(Document, f32)>, RagwireError> {
        self.similarity_search_with_filter(query, k, &MetadataFilter::new(), embeddings)
            .await
    }

    async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Document>, RagwireError> {
        let hits = self.search(embedding, k, &MetadataFilter::new()).await?;
        Ok(hits.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn delete(&self, ids: &[&str]) -> Result<(), RagwireError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut vars = self.base_vars();
        let mut sql = String::new();
        for (i, id) in ids.iter().enumerate() {
            vars.insert(format!("id{i}"), Value::String((*id).to_string()));
            sql.push_str(&format!("DELETE type::thing($tb, $id{i});\n"));
        }
        self.rpc.query(&sql, vars).await?;
        tracing::debug!(table = %self.config.table, count = ids.len(), "deleted documents from SurrealDB");
        Ok(())
    }

    async fn get_by_ids(&self, ids: &[&str]) -> Result<Vec<Document>, RagwireError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut vars = self.base_vars();
        let mut sql = String::new();
        for (i, id) in ids.iter().enumerate() {
            vars.insert(format!("id{i}"), Value::String((*id).to_string()));
            sql.push_str(&format!(
                "SELECT id, text, metadata FROM type::thing($tb, $id{i});\n"
            ));
        }
        let results = self.rpc.query(&sql, vars).await?;
        Ok(results
            .iter()
            .filter_map(|result| match result {
                Value::Array(rows) => rows.first().map(row_to_document),
                Value::Object(_) => Some(row_to_document(result)),
                _ => None,
            })
            .collect())
    }

    fn higher_score_is_closer(&self) -> bool {
        self.config.distance.higher_is_closer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_conversion() {
        let doc = row_to_document(&json!({
            "id": "documents:⟨a-1⟩",
            "text": "hello",
            "metadata": {"source": "wiki"},
            "score": 0.9
        }));
        assert_eq!(doc.id, "a-1");
        assert_eq!(doc.content, "hello");
        assert_eq!(doc.metadata["source"], json!("wiki"));
    }

    #[test]
    fn row_without_metadata() {
        let doc = row_to_document(&json!({"id": "documents:x", "text": "t"}));
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn rejects_invalid_table() {
        let config = SurrealConfig::new("http://localhost:8000", "ns", "db", "docs;DROP");
        assert!(SurrealVectorStore::connect(config).is_err());
    }
}
