mod scripted;
pub use scripted::ScriptedChatModel;

pub mod backend;
pub use backend::{
    ByteStream, FakeBackend, HttpBackend, ProviderBackend, ProviderRequest, ProviderResponse,
};

mod retry;
pub use retry::{RetryBackend, RetryPolicy};
