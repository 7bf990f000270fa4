//! The remote text-completion capability used by the conversation layer.
//!
//! [`CompletionClient`] is the narrow contract the memory and session depend on:
//! persona, folded summary, live turns and the new input in, generated text out.
//! [`ProviderCompletionClient`] implements it over any chat-style [`LLMProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::prompt::{SUMMARY_HEADING, has_history};
use crate::{ChatMessage, ChatOptions, LLMProvider, Role, Turn};

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate the next reply.
    ///
    /// # Arguments
    /// * `persona` - System instruction for this call
    /// * `prior_summary` - Summary of turns no longer in `prior_turns`
    /// * `prior_turns` - Live turns, oldest first
    /// * `new_input` - Text to respond to
    async fn complete(
        &self,
        persona: &str,
        prior_summary: &str,
        prior_turns: &[Turn],
        new_input: &str,
    ) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(
        &self,
        persona: &str,
        prior_summary: &str,
        prior_turns: &[Turn],
        new_input: &str,
    ) -> anyhow::Result<String> {
        (**self)
            .complete(persona, prior_summary, prior_turns, new_input)
            .await
    }
}

/// Adapts a chat-message provider to [`CompletionClient`].
pub struct ProviderCompletionClient<P = Arc<dyn LLMProvider>>
where
    P: Send + Sync,
{
    provider: P,
    options: ChatOptions,
}

impl<P> ProviderCompletionClient<P>
where
    P: LLMProvider + Send + Sync,
{
    pub const fn new(provider: P, options: ChatOptions) -> Self {
        Self { provider, options }
    }

    /// Assemble the chat request.
    ///
    /// Layout: persona, optional summary, live turns, new user input. The
    /// summary message is left out until something has actually been folded.
    #[must_use]
    pub fn build_messages(
        persona: &str,
        prior_summary: &str,
        prior_turns: &[Turn],
        new_input: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(prior_turns.len() + 3);
        messages.push(ChatMessage::new(Role::System, persona));

        if has_history(prior_summary) {
            messages.push(ChatMessage::new(
                Role::System,
                format!("{SUMMARY_HEADING}\n{prior_summary}"),
            ));
        }

        messages.extend(prior_turns.iter().map(ChatMessage::from));
        messages.push(ChatMessage::new(Role::User, new_input));
        messages
    }
}

#[async_trait]
impl<P> CompletionClient for ProviderCompletionClient<P>
where
    P: LLMProvider + Send + Sync,
{
    async fn complete(
        &self,
        persona: &str,
        prior_summary: &str,
        prior_turns: &[Turn],
        new_input: &str,
    ) -> anyhow::Result<String> {
        let messages = Self::build_messages(persona, prior_summary, prior_turns, new_input);
        debug!(
            "Requesting completion: {} messages, model={}",
            messages.len(),
            self.options.model
        );

        let response = self.provider.chat(&messages, &self.options).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(response.content)
    }
}
