//! Folding evicted turns into the running summary.

use std::sync::Arc;

use async_trait::async_trait;
use mentor_core::prompt::{SUMMARIZER_PERSONA, has_history, summary_prompt};
use mentor_core::turn::transcript;
use mentor_core::{CompletionClient, Turn};
use tracing::debug;

/// Produces an updated summary from the previous one plus new turns.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// # Arguments
    /// * `current_summary` - Summary so far (may be the no-history sentinel)
    /// * `turns` - Turns being folded in, oldest first
    async fn summarize(&self, current_summary: &str, turns: &[Turn]) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: Summarizer + ?Sized> Summarizer for Arc<T> {
    async fn summarize(&self, current_summary: &str, turns: &[Turn]) -> anyhow::Result<String> {
        (**self).summarize(current_summary, turns).await
    }
}

/// Summarizer backed by the same completion capability used for replies.
pub struct CompletionSummarizer<C = Arc<dyn CompletionClient>>
where
    C: Send + Sync,
{
    client: C,
}

impl<C> CompletionSummarizer<C>
where
    C: CompletionClient + Send + Sync,
{
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Prompt sent for one fold. The sentinel summary is sent as empty.
    #[must_use]
    pub fn prompt(current_summary: &str, turns: &[Turn]) -> String {
        let current = if has_history(current_summary) {
            current_summary
        } else {
            ""
        };
        summary_prompt(current, &transcript(turns))
    }
}

#[async_trait]
impl<C> Summarizer for CompletionSummarizer<C>
where
    C: CompletionClient + Send + Sync,
{
    async fn summarize(&self, current_summary: &str, turns: &[Turn]) -> anyhow::Result<String> {
        let prompt = Self::prompt(current_summary, turns);
        debug!("Summarizing {} turns", turns.len());

        let summary = self
            .client
            .complete(SUMMARIZER_PERSONA, "", &[], &prompt)
            .await?;

        Ok(summary.trim().to_string())
    }
}
