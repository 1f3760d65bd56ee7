mod adapters;
mod lambda;
mod passthrough;
mod runnable;
mod sequence;

pub use adapters::{format_documents, ChatModelRunnable, RetrieverRunnable};
pub use lambda::RunnableLambda;
pub use passthrough::RunnablePassthrough;
pub use runnable::{BoxRunnable, Runnable, RunnableOutputStream};
pub use sequence::RunnableSequence;
