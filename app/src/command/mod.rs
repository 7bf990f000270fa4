//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use std::sync::Arc;

use mentor_config::{Config, EstimatorKind};
use mentor_conversation::{
    ApproxTokenEstimator, CharCountEstimator, CompletionSummarizer, ConversationMemory,
    ConversationSession, TokenEstimator,
};
use mentor_core::{CompletionClient, ProviderCompletionClient};
use mentor_providers::{OpenAIProvider, RetryPolicy};
use tracing::info;

mod chat;
mod info;
mod init;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Estimator selected by the memory configuration.
fn estimator_for(config: &Config) -> Arc<dyn TokenEstimator> {
    match config.memory.estimator {
        EstimatorKind::ApproxTokens => {
            Arc::new(ApproxTokenEstimator::new(config.memory.chars_per_token))
        }
        EstimatorKind::Chars => Arc::new(CharCountEstimator),
    }
}

/// Wire provider, summarizer and memory into a ready session.
///
/// The same completion client answers turns and writes summaries.
fn build_session(
    config: &Config,
    model: Option<String>,
    token_budget: Option<usize>,
) -> anyhow::Result<ConversationSession> {
    let provider_config = &config.providers.openai;
    let provider = OpenAIProvider::new(provider_config.api_key()?, provider_config.request_timeout())?
        .with_base_url(provider_config.base_url.clone())
        .with_retry_policy(RetryPolicy::new(provider_config.retry_delays()));

    let options = config.agents.defaults.chat_options(model);
    let token_budget = token_budget.unwrap_or(config.memory.token_budget);
    info!(
        "Using model {} with a history budget of {token_budget} tokens",
        options.model
    );

    let client: Arc<dyn CompletionClient> =
        Arc::new(ProviderCompletionClient::new(provider, options));
    let summarizer = Arc::new(CompletionSummarizer::new(client.clone()));

    let memory = ConversationMemory::new(
        config.agents.defaults.persona(),
        token_budget,
        summarizer,
    )
    .with_estimator(estimator_for(config));

    Ok(ConversationSession::new(client, memory))
}
