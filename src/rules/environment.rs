//! Environment contract consumed by the search engine.
//!
//! Domains implement `Environment` to define:
//! - How an action transforms a state
//! - Which actions are legal
//! - When a state is terminal and what it pays out
//! - How actions map onto the apprentice's fixed action-index space

use std::fmt::Debug;

use crate::mcts::SearchError;

/// Environment trait.
///
/// The search engine never inspects states or actions beyond equality; all
/// domain knowledge lives behind these methods.
///
/// ## Implementation Notes
///
/// - `transition`: Must be pure and deterministic
/// - `actions`: Empty iff `is_terminal` is true
/// - `reward`: `Some` iff `is_terminal` is true, from the perspective of the
///   player who moved into the state
pub trait Environment: Send + Sync {
    /// Domain state. Compared with `==` when matching tree nodes.
    type State: Clone + Eq + Debug + Send + Sync;

    /// Domain action.
    type Action: Clone + Eq + Debug + Send + Sync;

    /// Apply an action to a state, returning the successor.
    fn transition(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Legal actions at `state`.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Terminal payout, or `None` if the game continues.
    fn reward(&self, state: &Self::State) -> Option<f64>;

    /// Check if the game is over.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Size of the fixed action-index space used by apprentice distributions.
    fn action_space_size(&self) -> usize;

    /// Index of `action` in the action-index space.
    fn action_index(&self, action: &Self::Action) -> Option<usize>;

    /// Decode an index from the action-index space into a domain action.
    ///
    /// The decoded action is not necessarily legal in any particular state.
    fn action_from_index(&self, index: usize) -> Option<Self::Action>;

    // === Convenience Methods ===

    /// Reject states where `is_terminal`, `actions` and `reward` disagree.
    fn check_consistent(&self, state: &Self::State) -> Result<(), SearchError> {
        let terminal = self.is_terminal(state);
        let has_actions = !self.actions(state).is_empty();
        let has_reward = self.reward(state).is_some();

        if terminal == has_actions {
            return Err(SearchError::ContractViolation(format!(
                "is_terminal = {terminal} but {} legal actions at {state:?}",
                if has_actions { "some" } else { "no" }
            )));
        }
        if terminal != has_reward {
            return Err(SearchError::ContractViolation(format!(
                "is_terminal = {terminal} but reward is {} at {state:?}",
                if has_reward { "defined" } else { "undefined" }
            )));
        }
        Ok(())
    }
}
