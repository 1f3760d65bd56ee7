use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use ragwire_core::{
    AIMessageChunk, ChatModel, ChatRequest, ChatResponse, ChatStream, Document, Message,
    RagwireError, Retriever, RunnableConfig,
};
use ragwire_models::ScriptedChatModel;
use ragwire_runnables::{
    format_documents, ChatModelRunnable, RetrieverRunnable, Runnable, RunnableLambda,
};

struct KeywordRetriever {
    docs: Vec<Document>,
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Document>, RagwireError> {
        Ok(self
            .docs
            .iter()
            .filter(|d| d.content.contains(query))
            .take(top_k)
            .cloned()
            .collect())
    }
}

fn retriever() -> Arc<dyn Retriever> {
    Arc::new(KeywordRetriever {
        docs: vec![
            Document::new("1", "Rust has ownership"),
            Document::new("2", "Python has a GIL"),
            Document::new("3", "Rust has traits"),
        ],
    })
}

#[tokio::test]
async fn retriever_runnable_forwards_query_and_top_k() {
    let runnable = RetrieverRunnable::new(retriever(), 1);
    let docs = runnable
        .invoke("Rust".to_string(), &RunnableConfig::default())
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "1");
}

#[test]
fn format_documents_joins_with_blank_lines() {
    let docs = vec![Document::new("a", "one"), Document::new("b", "two")];
    assert_eq!(format_documents(&docs), "one\n\ntwo");
    assert_eq!(format_documents(&[]), "");
}

#[tokio::test]
async fn retrieval_chain_reaches_chat_model() {
    let model = Arc::new(ScriptedChatModel::new(vec![ChatResponse {
        message: Message::ai("Rust uses ownership and traits."),
        usage: None,
    }]));

    let chain = RetrieverRunnable::new(retriever(), 5).boxed()
        | RunnableLambda::new(|docs: Vec<Document>| async move {
            Ok(ChatRequest::new(vec![
                Message::system(format!("Context:\n{}", format_documents(&docs))),
                Message::human("What does Rust have?"),
            ]))
        })
        .boxed()
        | ChatModelRunnable::new(model).boxed();

    let answer = chain
        .invoke("Rust".to_string(), &RunnableConfig::default())
        .await
        .unwrap();
    assert_eq!(answer.content(), "Rust uses ownership and traits.");
}

struct TwoChunkModel;

#[async_trait]
impl ChatModel for TwoChunkModel {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, RagwireError> {
        Ok(ChatResponse {
            message: Message::ai("ab"),
            usage: None,
        })
    }

    fn stream_chat(&self, _request: ChatRequest) -> ChatStream<'_> {
        Box::pin(futures::stream::iter(vec![
            Ok(AIMessageChunk {
                content: "a".to_string(),
                usage: None,
            }),
            Ok(AIMessageChunk {
                content: "b".to_string(),
                usage: None,
            }),
        ]))
    }
}

#[tokio::test]
async fn chat_model_runnable_streams_chunks() {
    let runnable = ChatModelRunnable::new(Arc::new(TwoChunkModel));
    let config = RunnableConfig::default();
    let parts: Vec<String> = runnable
        .stream(ChatRequest::new(vec![Message::human("x")]), &config)
        .map(|m| m.unwrap().content().to_string())
        .collect()
        .await;
    assert_eq!(parts, vec!["a", "b"]);
}

struct RunName;

#[async_trait]
impl Runnable<(), Option<String>> for RunName {
    async fn invoke(
        &self,
        _input: (),
        config: &RunnableConfig,
    ) -> Result<Option<String>, RagwireError> {
        Ok(config.run_name.clone())
    }
}

#[tokio::test]
async fn with_config_overrides_invocation_config() {
    let fixed = RunName
        .boxed()
        .with_config(RunnableConfig::default().with_run_name("fixed"));
    let out = fixed
        .invoke((), &RunnableConfig::default().with_run_name("caller"))
        .await
        .unwrap();
    assert_eq!(out.as_deref(), Some("fixed"));
}
