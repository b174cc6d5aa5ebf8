//! Apprentice traits for policy and value guidance.
//!
//! The search engine consumes a learned model only through `Apprentice`:
//! an action distribution, a scalar evaluation, and a training update.

use std::path::Path;

use thiserror::Error;

/// Errors raised by apprentice training and persistence.
#[derive(Debug, Error)]
pub enum ApprenticeError {
    #[error("model I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("model encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("model expects {expected} actions, environment has {actual}")]
    Incompatible { expected: usize, actual: usize },

    #[error("trajectory has {states} states for {actions} actions")]
    TrajectoryMismatch { states: usize, actions: usize },
}

/// Learned guidance for search.
///
/// Queries take `&self` and implementations are `Sync`, so root-parallel
/// workers may query one shared instance concurrently. Training takes
/// `&mut self` and therefore never overlaps a search.
pub trait Apprentice<S, A>: Send + Sync {
    /// Probability distribution over the environment's action-index space.
    ///
    /// May put mass on actions that are illegal in `state`.
    fn action_distribution(&self, state: &S) -> Vec<f32>;

    /// Value estimate for the player who moved into `state`.
    fn evaluate(&self, state: &S) -> f64;

    /// One update per transition of a finished self-play game.
    ///
    /// `states` holds every position including the final one, so it is one
    /// longer than `actions`. `terminal_reward` is the reward of the final
    /// state; per-ply signs are derived from trajectory parity.
    fn train(&mut self, states: &[S], actions: &[A], terminal_reward: f64)
        -> Result<(), ApprenticeError>;

    /// Persist model state to `path`.
    fn save(&self, _path: &Path) -> Result<(), ApprenticeError> {
        Ok(())
    }
}

/// Uniform policy with a zero evaluation (baseline for testing).
#[derive(Clone, Debug, Default)]
pub struct UniformApprentice {
    action_space_size: usize,
}

impl UniformApprentice {
    /// Create a new uniform apprentice.
    pub fn new(action_space_size: usize) -> Self {
        Self { action_space_size }
    }
}

impl<S, A> Apprentice<S, A> for UniformApprentice {
    fn action_distribution(&self, _state: &S) -> Vec<f32> {
        if self.action_space_size == 0 {
            return vec![];
        }
        let prob = 1.0 / self.action_space_size as f32;
        vec![prob; self.action_space_size]
    }

    fn evaluate(&self, _state: &S) -> f64 {
        0.0
    }

    fn train(&mut self, states: &[S], actions: &[A], _terminal_reward: f64) -> Result<(), ApprenticeError> {
        check_trajectory(states.len(), actions.len())
    }
}

/// Validate the states/actions shape of a trajectory.
pub(crate) fn check_trajectory(states: usize, actions: usize) -> Result<(), ApprenticeError> {
    if states != actions + 1 {
        return Err(ApprenticeError::TrajectoryMismatch { states, actions });
    }
    Ok(())
}
