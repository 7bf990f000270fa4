//! Chat-completion providers.

mod openai;
mod retry;

pub use openai::OpenAIProvider;
pub use retry::{RetryPolicy, retry_with_backoff};
