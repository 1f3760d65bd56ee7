use std::ops::BitOr;

use async_trait::async_trait;
use ragwire_core::{RagwireError, RunnableConfig};

use crate::runnable::{BoxRunnable, Runnable, RunnableOutputStream};

/// Chains two runnables: output of `first` feeds into `second`.
/// Created by the `|` operator on `BoxRunnable`.
pub struct RunnableSequence<I, M, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    first: BoxRunnable<I, M>,
    second: BoxRunnable<M, O>,
}

impl<I, M, O> RunnableSequence<I, M, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    pub fn new(first: BoxRunnable<I, M>, second: BoxRunnable<M, O>) -> Self {
        Self { first, second }
    }
}

#[async_trait]
impl<I, M, O> Runnable<I, O> for RunnableSequence<I, M, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    async fn invoke(&self, input: I, config: &RunnableConfig) -> Result<O, RagwireError> {
        let mid = self.first.invoke(input, config).await?;
        self.second.invoke(mid, config).await
    }

    /// Invokes the first step fully, then streams the second.
    fn stream<'a>(&'a self, input: I, config: &'a RunnableConfig) -> RunnableOutputStream<'a, O>
    where
        I: 'a,
    {
        Box::pin(async_stream::stream! {
            match self.first.invoke(input, config).await {
                Ok(mid) => {
                    use futures::StreamExt;
                    let mut s = std::pin::pin!(self.second.stream(mid, config));
                    while let Some(item) = s.next().await {
                        yield item;
                    }
                }
                Err(e) => yield Err(e),
            }
        })
    }
}

impl<I, M, O> BitOr<BoxRunnable<M, O>> for BoxRunnable<I, M>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    type Output = BoxRunnable<I, O>;

    fn bitor(self, rhs: BoxRunnable<M, O>) -> BoxRunnable<I, O> {
        BoxRunnable::new(RunnableSequence::new(self, rhs))
    }
}
