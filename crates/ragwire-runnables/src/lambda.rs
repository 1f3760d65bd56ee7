use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use ragwire_core::{RagwireError, RunnableConfig};

use crate::Runnable;

type AsyncFn<I, O> =
    dyn Fn(I) -> Pin<Box<dyn Future<Output = Result<O, RagwireError>> + Send>> + Send + Sync;

/// Wraps an async closure as a `Runnable`.
///
/// ```ignore
/// let prompt = RunnableLambda::new(|context: String| async move {
///     Ok(format!("Answer using:\n{context}"))
/// });
/// ```
pub struct RunnableLambda<I: Send + 'static, O: Send + 'static> {
    func: Box<AsyncFn<I, O>>,
}

impl<I: Send + 'static, O: Send + 'static> RunnableLambda<I, O> {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RagwireError>> + Send + 'static,
    {
        Self {
            func: Box::new(move |input| Box::pin(func(input))),
        }
    }
}

#[async_trait]
impl<I: Send + 'static, O: Send + 'static> Runnable<I, O> for RunnableLambda<I, O> {
    async fn invoke(&self, input: I, _config: &RunnableConfig) -> Result<O, RagwireError> {
        (self.func)(input).await
    }
}
