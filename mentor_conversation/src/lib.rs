#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Multi-turn conversation with a summarizing, token-bounded memory.
//!
//! # Key Features
//! - Recent turns kept verbatim until their estimated size exceeds a token budget
//! - Overflowing turns folded into a running summary with a single model call
//! - A failed summarization never drops turns; it is retried on the next exchange
//! - One exchange in flight per session, enforced by `&mut self`

mod estimate;
mod memory;
mod session;
mod summarizer;

pub use estimate::{ApproxTokenEstimator, CharCountEstimator, TokenEstimator};
pub use memory::{ConversationContext, ConversationMemory, MemoryError, MemoryStats};
pub use session::{ConversationSession, SessionError, TurnReply};
pub use summarizer::{CompletionSummarizer, Summarizer};
