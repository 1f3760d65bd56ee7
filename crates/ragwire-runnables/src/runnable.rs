use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use ragwire_core::{RagwireError, RunnableConfig};

/// A stream of results from a runnable.
pub type RunnableOutputStream<'a, O> =
    Pin<Box<dyn Stream<Item = Result<O, RagwireError>> + Send + 'a>>;

/// The composition trait. Retrievers, chat models and closures all plug in through it.
///
/// Implementors only need to provide `invoke`. `batch` runs inputs sequentially and
/// `stream` wraps `invoke` as a single-item stream unless overridden.
#[async_trait]
pub trait Runnable<I, O>: Send + Sync
where
    I: Send + 'static,
    O: Send + 'static,
{
    async fn invoke(&self, input: I, config: &RunnableConfig) -> Result<O, RagwireError>;

    async fn batch(&self, inputs: Vec<I>, config: &RunnableConfig) -> Vec<Result<O, RagwireError>> {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            results.push(self.invoke(input, config).await);
        }
        results
    }

    fn stream<'a>(&'a self, input: I, config: &'a RunnableConfig) -> RunnableOutputStream<'a, O>
    where
        I: 'a,
    {
        Box::pin(async_stream::stream! {
            match self.invoke(input, config).await {
                Ok(output) => yield Ok(output),
                Err(e) => yield Err(e),
            }
        })
    }

    /// Type-erase this runnable so it can be composed with `|`.
    fn boxed(self) -> BoxRunnable<I, O>
    where
        Self: Sized + 'static,
    {
        BoxRunnable::new(self)
    }
}

// Lets `BoxRunnable` forward `stream()` through the trait object.
trait RunnableStream<I: Send + 'static, O: Send + 'static>: Runnable<I, O> {
    fn stream_boxed<'a>(
        &'a self,
        input: I,
        config: &'a RunnableConfig,
    ) -> RunnableOutputStream<'a, O>
    where
        I: 'a;
}

impl<I: Send + 'static, O: Send + 'static, T: Runnable<I, O>> RunnableStream<I, O> for T {
    fn stream_boxed<'a>(
        &'a self,
        input: I,
        config: &'a RunnableConfig,
    ) -> RunnableOutputStream<'a, O>
    where
        I: 'a,
    {
        self.stream(input, config)
    }
}

/// A type-erased runnable that supports the `|` pipe operator.
///
/// ```ignore
/// let chain = retriever.boxed() | format.boxed() | prompt.boxed() | model.boxed();
/// let answer = chain.invoke("question".to_string(), &config).await?;
/// ```
pub struct BoxRunnable<I: Send + 'static, O: Send + 'static> {
    inner: Box<dyn RunnableStream<I, O>>,
}

impl<I: Send + 'static, O: Send + 'static> BoxRunnable<I, O> {
    pub fn new<R: Runnable<I, O> + 'static>(runnable: R) -> Self {
        Self {
            inner: Box::new(runnable),
        }
    }

    /// Return a runnable that always uses `config`, ignoring the one passed at invocation.
    pub fn with_config(self, config: RunnableConfig) -> BoxRunnable<I, O> {
        BoxRunnable::new(FixedConfig {
            inner: self,
            config,
        })
    }
}

#[async_trait]
impl<I: Send + 'static, O: Send + 'static> Runnable<I, O> for BoxRunnable<I, O> {
    async fn invoke(&self, input: I, config: &RunnableConfig) -> Result<O, RagwireError> {
        self.inner.invoke(input, config).await
    }

    async fn batch(&self, inputs: Vec<I>, config: &RunnableConfig) -> Vec<Result<O, RagwireError>> {
        self.inner.batch(inputs, config).await
    }

    fn stream<'a>(&'a self, input: I, config: &'a RunnableConfig) -> RunnableOutputStream<'a, O>
    where
        I: 'a,
    {
        self.inner.stream_boxed(input, config)
    }
}

struct FixedConfig<I: Send + 'static, O: Send + 'static> {
    inner: BoxRunnable<I, O>,
    config: RunnableConfig,
}

#[async_trait]
impl<I: Send + 'static, O: Send + 'static> Runnable<I, O> for FixedConfig<I, O> {
    async fn invoke(&self, input: I, _config: &RunnableConfig) -> Result<O, RagwireError> {
        self.inner.invoke(input, &self.config).await
    }

    fn stream<'a>(&'a self, input: I, _config: &'a RunnableConfig) -> RunnableOutputStream<'a, O>
    where
        I: 'a,
    {
        self.inner.stream(input, &self.config)
    }
}
