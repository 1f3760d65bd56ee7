use async_trait::async_trait;
use ragwire_core::{RagwireError, RunnableConfig};

use crate::Runnable;

/// Passes the input through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunnablePassthrough;

#[async_trait]
impl<T> Runnable<T, T> for RunnablePassthrough
where
    T: Send + Sync + 'static,
{
    async fn invoke(&self, input: T, _config: &RunnableConfig) -> Result<T, RagwireError> {
        Ok(input)
    }
}
