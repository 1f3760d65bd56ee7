use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::{
    ChatModel, ChatRequest, Document, Message, RagwireError, Retriever, RunnableConfig,
};

use crate::runnable::{Runnable, RunnableOutputStream};

/// Exposes a [`Retriever`] as a `String -> Vec<Document>` step.
pub struct RetrieverRunnable {
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl RetrieverRunnable {
    pub fn new(retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self { retriever, top_k }
    }
}

#[async_trait]
impl Runnable<String, Vec<Document>> for RetrieverRunnable {
    async fn invoke(
        &self,
        input: String,
        _config: &RunnableConfig,
    ) -> Result<Vec<Document>, RagwireError> {
        self.retriever.retrieve(&input, self.top_k).await
    }
}

/// Exposes a [`ChatModel`] as a `ChatRequest -> Message` step.
///
/// Streaming yields one AI message per chunk produced by the model.
pub struct ChatModelRunnable {
    model: Arc<dyn ChatModel>,
}

impl ChatModelRunnable {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Runnable<ChatRequest, Message> for ChatModelRunnable {
    async fn invoke(
        &self,
        input: ChatRequest,
        _config: &RunnableConfig,
    ) -> Result<Message, RagwireError> {
        Ok(self.model.chat(input).await?.message)
    }

    fn stream<'a>(
        &'a self,
        input: ChatRequest,
        _config: &'a RunnableConfig,
    ) -> RunnableOutputStream<'a, Message>
    where
        ChatRequest: 'a,
    {
        Box::pin(async_stream::stream! {
            use futures::StreamExt;
            let mut chunks = self.model.stream_chat(input);
            while let Some(chunk) = chunks.next().await {
                yield chunk.map(|c| c.into_message());
            }
        })
    }
}

/// Join document contents with blank lines, the usual "context" block of a prompt.
pub fn format_documents(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
