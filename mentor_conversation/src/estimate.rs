//! Size estimation for the turn log.
//!
//! Estimators must be deterministic and monotonic: appending a turn never
//! lowers the estimate. Both implementations here sum a non-negative
//! per-turn cost, which gives both properties.

use mentor_core::Turn;

/// Maps an ordered run of turns to model-token units.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, turns: &[Turn]) -> usize;
}

/// Counts characters (Unicode scalar values).
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCountEstimator;

impl TokenEstimator for CharCountEstimator {
    fn estimate(&self, turns: &[Turn]) -> usize {
        turns.iter().map(|t| t.text().chars().count()).sum()
    }
}

/// Rough token count: characters per turn divided by `chars_per_token`,
/// rounded up.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTokenEstimator {
    chars_per_token: usize,
}

impl ApproxTokenEstimator {
    /// A ratio of zero is treated as one.
    #[must_use]
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    #[must_use]
    pub const fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for ApproxTokenEstimator {
    fn default() -> Self {
        // Rough estimate: 4 chars per token
        Self::new(4)
    }
}

impl TokenEstimator for ApproxTokenEstimator {
    fn estimate(&self, turns: &[Turn]) -> usize {
        turns
            .iter()
            .map(|t| t.text().chars().count().div_ceil(self.chars_per_token))
            .sum()
    }
}
