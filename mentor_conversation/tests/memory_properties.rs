//! Behavioural properties of the summarizing conversation memory:
//! 1. The token budget holds after every successful record
//! 2. Folding is associative under a deterministic summarizer
//! 3. Reset restores the initial configuration
//! 4. Remote failures never lose or half-write turns

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mentor_conversation::{
    CharCountEstimator, ConversationMemory, ConversationSession, MemoryError, SessionError,
    Summarizer,
};
use mentor_core::prompt::NO_HISTORY_SUMMARY;
use mentor_core::{CompletionClient, Turn};

/// Deterministic fold: appends the turn texts to the previous summary.
struct ConcatSummarizer {
    seen: Mutex<Vec<(String, Vec<String>)>>,
    down: AtomicBool,
}

impl ConcatSummarizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            down: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Summarizer for ConcatSummarizer {
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn summarize(&self, current: &str, turns: &[Turn]) -> anyhow::Result<String> {
        let texts: Vec<String> = turns.iter().map(|t| t.text().to_string()).collect();
        self.seen
            .lock()
            .expect("lock poisoned")
            .push((current.to_string(), texts.clone()));
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("summarizer unavailable");
        }
        let folded = texts.join(" ");
        if current == NO_HISTORY_SUMMARY {
            Ok(folded)
        } else {
            Ok(format!("{current} {folded}"))
        }
    }
}

/// Always answers with a fixed reply, or fails when `down` is set.
struct FixedClient {
    reply: String,
    down: AtomicBool,
}

#[async_trait]
impl CompletionClient for FixedClient {
    async fn complete(
        &self,
        _persona: &str,
        _prior_summary: &str,
        _prior_turns: &[Turn],
        _new_input: &str,
    ) -> anyhow::Result<String> {
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset by peer");
        }
        Ok(self.reply.clone())
    }
}

fn char_memory(budget: usize, summarizer: Arc<ConcatSummarizer>) -> ConversationMemory {
    ConversationMemory::new("You are a CBT/DBT mentor.", budget, summarizer)
        .with_estimator(Arc::new(CharCountEstimator))
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn small_exchanges_stay_uncompressed() {
    let summarizer = ConcatSummarizer::new();
    let mut memory = char_memory(1000, summarizer.clone());

    // Five exchanges of 10 characters each.
    for _ in 0..5 {
        memory.record("hello", "there").await.expect("record");
    }

    assert_eq!(memory.estimated_size(), 50);
    assert_eq!(memory.stats().user_turns, 5);
    assert_eq!(memory.turns().len(), 10);
    assert_eq!(memory.summary(), NO_HISTORY_SUMMARY);
    assert!(summarizer.seen.lock().expect("lock poisoned").is_empty());
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn overflow_replaces_summary_and_clears_log() {
    struct Summary1;

    #[async_trait]
    impl Summarizer for Summary1 {
        async fn summarize(&self, _current: &str, _turns: &[Turn]) -> anyhow::Result<String> {
            Ok("summary1".to_string())
        }
    }

    let mut memory = ConversationMemory::new("persona", 50, Arc::new(Summary1))
        .with_estimator(Arc::new(CharCountEstimator));

    memory
        .record(&"u".repeat(30), &"a".repeat(30))
        .await
        .expect("record");

    assert!(memory.turns().is_empty());
    assert_eq!(memory.summary(), "summary1");
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn budget_holds_after_every_record() {
    let budget = 40;
    let mut memory = char_memory(budget, ConcatSummarizer::new());

    for i in 0..25 {
        let user = format!("user says {}", "x".repeat(i % 7 + 1));
        let reply = format!("mentor replies {}", "y".repeat(i % 5 + 1));
        memory.record(&user, &reply).await.expect("record");
        assert!(memory.estimated_size() <= budget);
    }
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn folding_in_two_passes_matches_one_pass() {
    let summarizer = ConcatSummarizer::new();

    // Budget 15 evicts each exchange on its own; budget 35 folds both at once.
    let mut tight = char_memory(15, summarizer.clone());
    tight.record("AAAAAAAAAA", "BBBBBBBBBB").await.expect("record");
    tight.record("CCCCCCCCCC", "DDDDDDDDDD").await.expect("record");

    let mut single = char_memory(35, ConcatSummarizer::new());
    single.record("AAAAAAAAAA", "BBBBBBBBBB").await.expect("record");
    single.record("CCCCCCCCCC", "DDDDDDDDDD").await.expect("record");

    assert_eq!(
        tight.summary(),
        "AAAAAAAAAA BBBBBBBBBB CCCCCCCCCC DDDDDDDDDD"
    );
    assert_eq!(tight.summary(), single.summary());

    // Each fold saw the previous summary and exactly the turns evicted since.
    let seen = summarizer.seen.lock().expect("lock poisoned");
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, NO_HISTORY_SUMMARY);
    assert_eq!(seen[0].1, vec!["AAAAAAAAAA", "BBBBBBBBBB"]);
    assert_eq!(seen[1].0, "AAAAAAAAAA BBBBBBBBBB");
    assert_eq!(seen[1].1, vec!["CCCCCCCCCC", "DDDDDDDDDD"]);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn reset_restores_initial_configuration() {
    let mut memory = char_memory(15, ConcatSummarizer::new());
    memory.record("0123456789", "0123456789").await.expect("record");
    memory.record("short", "reply").await.expect("record");
    assert!(memory.has_summary());

    memory.reset();

    assert!(memory.turns().is_empty());
    assert_eq!(memory.summary(), NO_HISTORY_SUMMARY);
    assert_eq!(memory.token_budget(), 15);
    assert_eq!(memory.persona(), "You are a CBT/DBT mentor.");
    assert_eq!(memory.stats().compressions, 0);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn failed_summarization_keeps_every_turn() {
    let summarizer = ConcatSummarizer::new();
    let mut memory = char_memory(30, summarizer.clone());
    memory.record("0123456789", "0123456789").await.expect("record");

    summarizer.down.store(true, Ordering::SeqCst);
    let err = memory
        .record("abcdefghij", "klmnopqrst")
        .await
        .expect_err("summarizer is down");

    assert!(matches!(err, MemoryError::CompressionFailed { .. }));
    let texts: Vec<&str> = memory.turns().iter().map(Turn::text).collect();
    assert_eq!(
        texts,
        vec!["0123456789", "0123456789", "abcdefghij", "klmnopqrst"]
    );
    assert_eq!(memory.summary(), NO_HISTORY_SUMMARY);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn remote_failure_leaves_memory_unchanged() {
    let client = Arc::new(FixedClient {
        reply: "Which DBT skill fits here?".to_string(),
        down: AtomicBool::new(false),
    });
    let mut session = ConversationSession::new(client.clone(), char_memory(1000, ConcatSummarizer::new()));
    session.handle_turn("I feel overwhelmed").await.expect("turn succeeds");

    let before_turns = session.memory().turns().to_vec();
    let before_summary = session.summary().to_string();

    client.down.store(true, Ordering::SeqCst);
    let err = session
        .handle_turn("Still overwhelmed")
        .await
        .expect_err("client is down");

    assert!(matches!(err, SessionError::RemoteCallFailed(_)));
    assert_eq!(session.memory().turns(), before_turns.as_slice());
    assert_eq!(session.summary(), before_summary);
}

#[tokio::test]
async fn empty_input_is_rejected_before_any_call() {
    let client = Arc::new(FixedClient {
        reply: "unused".to_string(),
        down: AtomicBool::new(true),
    });
    let mut session = ConversationSession::new(client, char_memory(1000, ConcatSummarizer::new()));

    let err = session.handle_turn("").await;

    assert!(matches!(err, Err(SessionError::InvalidInput(_))));
    assert!(session.memory().turns().is_empty());
}
