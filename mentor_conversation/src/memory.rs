//! Token-bounded conversation memory.
//!
//! Recent turns are kept verbatim in a log. Once the log's estimated size
//! exceeds the token budget, the whole log is folded into the running summary
//! with one summarizer call and then cleared.

use std::sync::Arc;

use mentor_core::prompt::{NO_HISTORY_SUMMARY, has_history};
use mentor_core::{InvalidInput, Speaker, Turn};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::estimate::{ApproxTokenEstimator, TokenEstimator};
use crate::summarizer::Summarizer;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error("Summarization failed, keeping {retained_turns} turns for the next attempt: {source}")]
    CompressionFailed {
        retained_turns: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Everything the next completion call needs, borrowed from the memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationContext<'a> {
    pub persona: &'a str,
    pub summary: &'a str,
    pub turns: &'a [Turn],
}

/// Snapshot of memory occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    pub turns: usize,
    pub user_turns: usize,
    pub assistant_turns: usize,
    pub estimated_tokens: usize,
    pub token_budget: usize,
    pub compressions: usize,
}

/// Turn log plus running summary for one conversation.
///
/// Not internally synchronized; callers serialize access (the session does so
/// by requiring `&mut self`).
pub struct ConversationMemory {
    persona: String,
    summary: String,
    turns: Vec<Turn>,
    token_budget: usize,
    compressions: usize,
    summarizer: Arc<dyn Summarizer>,
    estimator: Arc<dyn TokenEstimator>,
}

impl ConversationMemory {
    /// Create an empty memory using the approximate token estimator.
    pub fn new(
        persona: impl Into<String>,
        token_budget: usize,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            persona: persona.into(),
            summary: NO_HISTORY_SUMMARY.to_string(),
            turns: Vec::new(),
            token_budget,
            compressions: 0,
            summarizer,
            estimator: Arc::new(ApproxTokenEstimator::default()),
        }
    }

    /// Replace the size estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Append the user turn then the assistant turn, compressing if the log
    /// went over budget.
    ///
    /// Both texts are validated before anything is appended. On
    /// `CompressionFailed` the exchange is still recorded.
    pub async fn record(
        &mut self,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<(), MemoryError> {
        let user = Turn::user(user_text)?;
        let assistant = Turn::assistant(assistant_text)?;

        self.turns.push(user);
        self.turns.push(assistant);
        debug!(
            "Recorded exchange: {} turns, ~{} tokens of {}",
            self.turns.len(),
            self.estimated_size(),
            self.token_budget
        );

        self.compress_if_needed().await?;
        Ok(())
    }

    /// Estimated size of `turns` in token units.
    #[must_use]
    pub fn estimate_size(&self, turns: &[Turn]) -> usize {
        self.estimator.estimate(turns)
    }

    /// Estimated size of the current turn log.
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        self.estimate_size(&self.turns)
    }

    /// Fold the whole log into the summary if it exceeds the budget.
    ///
    /// Returns whether a compression happened. On failure the log is left
    /// untouched.
    pub async fn compress_if_needed(&mut self) -> Result<bool, MemoryError> {
        let size = self.estimated_size();
        if size <= self.token_budget {
            return Ok(false);
        }

        info!(
            "Turn log over budget ({size} > {}), summarizing {} turns",
            self.token_budget,
            self.turns.len()
        );

        let result = self
            .summarizer
            .summarize(&self.summary, &self.turns)
            .await
            .and_then(|summary| {
                if summary.trim().is_empty() {
                    Err(anyhow::anyhow!("Summarizer returned an empty summary"))
                } else {
                    Ok(summary)
                }
            });

        match result {
            Ok(summary) => {
                self.summary = summary;
                self.turns.clear();
                self.compressions += 1;
                info!("Conversation summarized (compression #{})", self.compressions);
                Ok(true)
            }
            Err(source) => {
                warn!("Summarization failed, keeping turn log: {source}");
                Err(MemoryError::CompressionFailed {
                    retained_turns: self.turns.len(),
                    source,
                })
            }
        }
    }

    /// Persona, summary and live turns for the next completion call.
    #[must_use]
    pub fn build_context(&self) -> ConversationContext<'_> {
        ConversationContext {
            persona: &self.persona,
            summary: &self.summary,
            turns: &self.turns,
        }
    }

    /// Drop all turns and the summary. Persona and budget are kept.
    pub fn reset(&mut self) {
        self.turns.clear();
        NO_HISTORY_SUMMARY.clone_into(&mut self.summary);
        self.compressions = 0;
        debug!("Conversation memory reset");
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Whether anything has been folded into the summary yet.
    #[must_use]
    pub fn has_summary(&self) -> bool {
        has_history(&self.summary)
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn persona(&self) -> &str {
        &self.persona
    }

    #[must_use]
    pub const fn token_budget(&self) -> usize {
        self.token_budget
    }

    #[must_use]
    pub fn stats(&self) -> MemoryStats {
        let user_turns = self
            .turns
            .iter()
            .filter(|t| t.speaker() == Speaker::User)
            .count();

        MemoryStats {
            turns: self.turns.len(),
            user_turns,
            assistant_turns: self.turns.len() - user_turns,
            estimated_tokens: self.estimated_size(),
            token_budget: self.token_budget,
            compressions: self.compressions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::CharCountEstimator;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingSummarizer {
        calls: AtomicUsize,
        fail: AtomicBool,
        reply: String,
    }

    impl CountingSummarizer {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl Summarizer for CountingSummarizer {
        async fn summarize(&self, _current: &str, _turns: &[Turn]) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("service unavailable");
            }
            Ok(self.reply.clone())
        }
    }

    fn memory(budget: usize, summarizer: Arc<CountingSummarizer>) -> ConversationMemory {
        ConversationMemory::new("persona", budget, summarizer)
            .with_estimator(Arc::new(CharCountEstimator))
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn records_user_then_assistant() {
        let summarizer = CountingSummarizer::new("unused");
        let mut memory = memory(1000, summarizer.clone());

        memory.record("question", "answer").await.expect("record");

        let turns = memory.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker(), Speaker::User);
        assert_eq!(turns[0].text(), "question");
        assert_eq!(turns[1].speaker(), Speaker::Assistant);
        assert_eq!(turns[1].text(), "answer");
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_mutation() {
        let mut memory = memory(1000, CountingSummarizer::new("unused"));

        let err = memory.record("hello", "   ").await;
        assert!(matches!(err, Err(MemoryError::InvalidInput(_))));
        let err = memory.record("", "reply").await;
        assert!(matches!(err, Err(MemoryError::InvalidInput(_))));
        assert!(memory.turns().is_empty());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn budget_exactly_met_does_not_compress() {
        let summarizer = CountingSummarizer::new("unused");
        let mut memory = memory(10, summarizer.clone());

        memory.record("01234", "56789").await.expect("record");

        assert_eq!(memory.estimated_size(), 10);
        assert_eq!(memory.turns().len(), 2);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn failed_compression_is_retried_on_next_record() {
        let summarizer = CountingSummarizer::new("folded");
        summarizer.fail.store(true, Ordering::SeqCst);
        let mut memory = memory(10, summarizer.clone());

        let err = memory
            .record("0123456789", "0123456789")
            .await
            .expect_err("summarizer is down");
        assert!(matches!(
            err,
            MemoryError::CompressionFailed {
                retained_turns: 2,
                ..
            }
        ));
        assert_eq!(memory.turns().len(), 2);
        assert_eq!(memory.summary(), NO_HISTORY_SUMMARY);

        summarizer.fail.store(false, Ordering::SeqCst);
        memory.record("again", "reply").await.expect("record");

        assert!(memory.turns().is_empty());
        assert_eq!(memory.summary(), "folded");
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_summary_counts_as_failure() {
        let mut memory = memory(5, CountingSummarizer::new("  "));

        let result = memory.record("0123456789", "reply").await;

        assert!(matches!(result, Err(MemoryError::CompressionFailed { .. })));
        assert_eq!(memory.turns().len(), 2);
        assert!(!memory.has_summary());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn build_context_is_read_only() {
        let mut memory = memory(1000, CountingSummarizer::new("unused"));
        memory.record("hi", "hello").await.expect("record");

        let first = memory.build_context();
        assert_eq!(first.persona, "persona");
        assert_eq!(first.summary, NO_HISTORY_SUMMARY);
        assert_eq!(first.turns.len(), 2);
        assert_eq!(first, memory.build_context());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn stats_reflect_log_and_compressions() {
        let mut memory = memory(12, CountingSummarizer::new("folded"));
        memory.record("abc", "defg").await.expect("record");

        let stats = memory.stats();
        assert_eq!(stats.turns, 2);
        assert_eq!(stats.user_turns, 1);
        assert_eq!(stats.assistant_turns, 1);
        assert_eq!(stats.estimated_tokens, 7);
        assert_eq!(stats.compressions, 0);

        memory.record("hijk", "lmno").await.expect("record");
        let stats = memory.stats();
        assert_eq!(stats.turns, 0);
        assert_eq!(stats.compressions, 1);
        assert_eq!(stats.token_budget, 12);
    }
}
