//! Role-tagged conversation turns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ChatMessage, Role};

/// Rejected text, raised before any state is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid input: {0}")]
pub struct InvalidInput(pub String);

/// Who produced a turn. System text never enters the turn log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Line prefix used when a turn is rendered into a summarization prompt.
    #[must_use]
    pub const fn transcript_label(self) -> &'static str {
        match self {
            Self::User => "Human",
            Self::Assistant => "AI",
        }
    }
}

impl From<Speaker> for Role {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Self::User,
            Speaker::Assistant => Self::Assistant,
        }
    }
}

/// One message of the conversation. Immutable once built.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    /// Build a turn, rejecting empty or whitespace-only text.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Result<Self, InvalidInput> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InvalidInput(format!(
                "{} turn text must not be empty",
                speaker.transcript_label()
            )));
        }
        Ok(Self { speaker, text })
    }

    pub fn user(text: impl Into<String>) -> Result<Self, InvalidInput> {
        Self::new(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Result<Self, InvalidInput> {
        Self::new(Speaker::Assistant, text)
    }

    #[must_use]
    pub const fn speaker(&self) -> Speaker {
        self.speaker
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `Human: ...` / `AI: ...` transcript line.
    #[must_use]
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.speaker.transcript_label(), self.text)
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self::new(turn.speaker.into(), turn.text.clone())
    }
}

/// Render turns as newline-separated transcript lines.
#[must_use]
pub fn transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(Turn::transcript_line)
        .collect::<Vec<_>>()
        .join("\n")
}
