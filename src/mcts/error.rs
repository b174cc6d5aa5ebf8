//! Fatal search conditions.
//!
//! None of these are retried. A search that hits one aborts and leaves the
//! caller's tree as it was before the failing operation started.

use thiserror::Error;

use crate::nn::ApprenticeError;

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Expansion, rollout, or search reached a state with nothing to play.
    #[error("no legal actions available {context}")]
    NoLegalActions { context: &'static str },

    /// A terminal state reported no reward.
    #[error("no reward at terminal state {0}; check the environment")]
    MissingReward(String),

    /// Merge was asked to combine nodes holding different states.
    #[error("cannot merge nodes with different states")]
    MergeStateMismatch,

    /// Merge was asked to combine a root with a non-root.
    #[error("cannot merge a root with a non-root")]
    MergeRootMismatch,

    /// A legal action has no corresponding child after search.
    #[error("tree and environment out of sync: no child for action {0}")]
    Desync(String),

    /// Best-action selection found legal children, none of them visited.
    #[error("no child has been visited yet; search with a nonzero budget")]
    Unsearched,

    /// The environment's terminal test, actions and reward disagree.
    #[error("environment contract violated: {0}")]
    ContractViolation(String),

    #[error("apprentice error: {0}")]
    Apprentice(#[from] ApprenticeError),
}
