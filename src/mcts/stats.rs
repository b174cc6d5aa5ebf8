//! Counters reported after a search.

use serde::{Deserialize, Serialize};

/// Counters for one search call, or the sum over workers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Select-expand-rollout-backprop cycles completed.
    pub iterations: u32,

    /// Expansions, each adding one batch of children.
    pub nodes_expanded: u32,

    /// Rollouts performed.
    pub rollouts: u32,

    /// Plies played across all rollouts.
    pub rollout_plies: u64,

    /// Rollout plies where guided sampling fell back to uniform.
    pub guided_fallbacks: u32,

    /// Maximum depth reached, counting rollout plies.
    pub max_depth: u32,

    /// Wall-clock time in microseconds.
    pub time_us: u64,
}

impl SearchStats {
    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold another worker's counters into these.
    ///
    /// Counters add up; `max_depth` takes the maximum. Elapsed time is left
    /// alone since workers run concurrently.
    pub fn absorb(&mut self, other: &SearchStats) {
        self.iterations += other.iterations;
        self.nodes_expanded += other.nodes_expanded;
        self.rollouts += other.rollouts;
        self.rollout_plies += other.rollout_plies;
        self.guided_fallbacks += other.guided_fallbacks;
        self.max_depth = self.max_depth.max(other.max_depth);
    }

    /// Throughput over the recorded wall-clock time.
    #[must_use]
    pub fn iterations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            f64::from(self.iterations) / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Mean play-out length in plies.
    #[must_use]
    pub fn avg_rollout_plies(&self) -> f64 {
        if self.rollouts == 0 {
            0.0
        } else {
            self.rollout_plies as f64 / f64::from(self.rollouts)
        }
    }
}
