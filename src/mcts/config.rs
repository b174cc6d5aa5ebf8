//! Search tuning: exploration, learned bonus, workers, seed and rollout.

use serde::{Deserialize, Serialize};

use crate::nn::Apprentice;
use crate::rules::Environment;

use super::policy::{GuidedRollout, RolloutPolicy, UctSelector, UniformRollout};

/// How leaves are played out to a terminal state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RolloutKind {
    /// Uniform random legal actions.
    Uniform,

    /// Sample from the apprentice, falling back to uniform after
    /// `max_retries` illegal resamples.
    Guided { max_retries: u32 },
}

impl RolloutKind {
    /// Build the rollout policy this kind names.
    pub fn build<E, P>(&self) -> Box<dyn RolloutPolicy<E, P>>
    where
        E: Environment,
        P: Apprentice<E::State, E::Action>,
    {
        match *self {
            RolloutKind::Uniform => Box::new(UniformRollout),
            RolloutKind::Guided { max_retries } => Box::new(GuidedRollout::new(max_retries)),
        }
    }
}

impl Default for RolloutKind {
    fn default() -> Self {
        RolloutKind::Uniform
    }
}

/// Parameters shared by sequential and parallel search.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Weight on the UCT exploration term.
    pub exploration_bias: f64,

    /// Weight on the apprentice's evaluation during selection.
    pub bonus_weight: f64,

    /// Root-parallel workers (0 = available hardware parallelism).
    pub workers: usize,

    /// Random seed for the search RNG.
    /// Same seed and worker count produce the same search.
    pub seed: u64,

    /// Rollout policy.
    pub rollout: RolloutKind,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration_bias: 0.5,
            bonus_weight: UctSelector::DEFAULT_BONUS_WEIGHT,
            workers: 0,
            seed: 42,
            rollout: RolloutKind::Uniform,
        }
    }
}

impl SearchConfig {
    /// Create a new config with custom exploration bias.
    pub fn with_exploration(mut self, bias: f64) -> Self {
        self.exploration_bias = bias;
        self
    }

    /// Seed for the root RNG stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Create a new config with a fixed worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Create a new config with a different rollout policy.
    pub fn with_rollout(mut self, rollout: RolloutKind) -> Self {
        self.rollout = rollout;
        self
    }

    /// Selector built from these parameters.
    #[must_use]
    pub fn selector(&self) -> UctSelector {
        UctSelector::new(self.exploration_bias).with_bonus_weight(self.bonus_weight)
    }

    /// Worker count with 0 resolved to the available parallelism.
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }
}
