//! One conversation with the mentor.
//!
//! A session owns its memory and drives single exchanges: validate input,
//! ask the completion client, record the exchange, report reply and summary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mentor_core::{CompletionClient, InvalidInput};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::memory::{ConversationMemory, MemoryError};

/// Errors surfaced by [`ConversationSession::handle_turn`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error("Remote completion failed: {0}")]
    RemoteCallFailed(#[source] anyhow::Error),

    /// The reply was produced and recorded, but folding the log into the
    /// summary failed. The log stays over budget until the next exchange.
    #[error("Reply recorded but summarization failed: {source}")]
    CompressionFailed {
        reply: TurnReply,
        #[source]
        source: anyhow::Error,
    },
}

impl SessionError {
    /// The reply carried by a `CompressionFailed` error.
    #[must_use]
    pub const fn reply(&self) -> Option<&TurnReply> {
        match self {
            Self::CompressionFailed { reply, .. } => Some(reply),
            _ => None,
        }
    }
}

/// Outcome of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub reply: String,
    /// Running summary after the exchange was recorded.
    pub summary: String,
    pub turn_number: usize,
}

/// Multi-turn session over a summarizing memory.
pub struct ConversationSession<C = Arc<dyn CompletionClient>>
where
    C: Send + Sync,
{
    id: Uuid,
    started_at: DateTime<Utc>,
    client: C,
    memory: ConversationMemory,
    turn_count: usize,
}

impl<C> ConversationSession<C>
where
    C: CompletionClient + Send + Sync,
{
    pub fn new(client: C, memory: ConversationMemory) -> Self {
        let id = Uuid::now_v7();
        info!("Starting conversation session: {id}");
        Self {
            id,
            started_at: Utc::now(),
            client,
            memory,
            turn_count: 0,
        }
    }

    /// Run one exchange.
    ///
    /// Memory is untouched unless the completion call succeeds with a
    /// non-blank reply.
    pub async fn handle_turn(&mut self, user_text: &str) -> Result<TurnReply, SessionError> {
        if user_text.trim().is_empty() {
            return Err(InvalidInput("message must not be empty".to_string()).into());
        }

        let turn_number = self.turn_count + 1;
        info!("Processing turn {turn_number} for session: {}", self.id);

        let context = self.memory.build_context();
        let reply = self
            .client
            .complete(context.persona, context.summary, context.turns, user_text)
            .await
            .map_err(SessionError::RemoteCallFailed)?;

        if reply.trim().is_empty() {
            return Err(SessionError::RemoteCallFailed(anyhow::anyhow!(
                "Empty response from completion service"
            )));
        }

        let recorded = self.memory.record(user_text, &reply).await;
        self.turn_count = turn_number;

        let outcome = TurnReply {
            reply,
            summary: self.memory.summary().to_string(),
            turn_number,
        };

        match recorded {
            Ok(()) => {
                debug!("Turn {turn_number} completed successfully");
                Ok(outcome)
            }
            Err(MemoryError::CompressionFailed { source, .. }) => {
                warn!("Turn {turn_number} recorded without summarization: {source}");
                Err(SessionError::CompressionFailed {
                    reply: outcome,
                    source,
                })
            }
            Err(MemoryError::InvalidInput(e)) => Err(e.into()),
        }
    }

    /// Start over: empty memory and a fresh session id.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.turn_count = 0;
        self.id = Uuid::now_v7();
        self.started_at = Utc::now();
        info!("Session reset, new session: {}", self.id);
    }

    #[must_use]
    pub const fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        self.memory.summary()
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Exchanges completed since the session started or was reset.
    #[must_use]
    pub const fn turn_count(&self) -> usize {
        self.turn_count
    }
}
