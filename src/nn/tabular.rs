//! Table-backed apprentice for small domains.
//!
//! Learns a value estimate and an action histogram per visited state. The
//! table is an `im::HashMap`, so a clone for a worker or a checkpoint is
//! O(1) and shares structure with the original.

use std::hash::{Hash, Hasher};
use std::path::Path;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::Environment;

use super::traits::{check_trajectory, Apprentice, ApprenticeError};

/// Learned statistics for one state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct TableEntry {
    /// Value for the player who moved into the state.
    value: f64,
    /// Number of value updates applied.
    updates: u32,
    /// Times each action index was played from the state.
    action_counts: Vec<u32>,
}

/// On-disk form of the table.
#[derive(Serialize, Deserialize)]
struct TableSnapshot {
    action_space_size: usize,
    learning_rate: f64,
    table: im::HashMap<u64, TableEntry>,
}

/// Tabular apprentice keyed by state hash.
#[derive(Clone, Debug)]
pub struct TabularApprentice<E> {
    env: E,
    learning_rate: f64,
    table: im::HashMap<u64, TableEntry>,
}

impl<E: Environment> TabularApprentice<E>
where
    E::State: Hash,
{
    /// Default step size for value updates.
    pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

    /// Create an empty table.
    pub fn new(env: E) -> Self {
        Self {
            env,
            learning_rate: Self::DEFAULT_LEARNING_RATE,
            table: im::HashMap::new(),
        }
    }

    /// Set the value learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Restore a table written by [`Apprentice::save`].
    pub fn load(env: E, path: &Path) -> Result<Self, ApprenticeError> {
        let bytes = std::fs::read(path)?;
        let snapshot: TableSnapshot = bincode::deserialize(&bytes)?;
        if snapshot.action_space_size != env.action_space_size() {
            return Err(ApprenticeError::Incompatible {
                expected: snapshot.action_space_size,
                actual: env.action_space_size(),
            });
        }
        debug!(path = %path.display(), states = snapshot.table.len(), "loaded apprentice table");
        Ok(Self {
            env,
            learning_rate: snapshot.learning_rate,
            table: snapshot.table,
        })
    }

    /// Number of states with learned statistics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn key(state: &E::State) -> u64 {
        let mut hasher = FxHasher::default();
        state.hash(&mut hasher);
        hasher.finish()
    }
}

impl<E: Environment> Apprentice<E::State, E::Action> for TabularApprentice<E>
where
    E::State: Hash,
{
    fn action_distribution(&self, state: &E::State) -> Vec<f32> {
        let n = self.env.action_space_size();
        if n == 0 {
            return vec![];
        }

        match self.table.get(&Self::key(state)) {
            Some(entry) if !entry.action_counts.is_empty() => {
                // Laplace smoothing keeps every index reachable.
                let total: u32 = entry.action_counts.iter().sum();
                let denom = (total as usize + n) as f32;
                (0..n)
                    .map(|i| (entry.action_counts.get(i).copied().unwrap_or(0) + 1) as f32 / denom)
                    .collect()
            }
            _ => vec![1.0 / n as f32; n],
        }
    }

    fn evaluate(&self, state: &E::State) -> f64 {
        self.table
            .get(&Self::key(state))
            .map_or(0.0, |entry| entry.value)
    }

    fn train(
        &mut self,
        states: &[E::State],
        actions: &[E::Action],
        terminal_reward: f64,
    ) -> Result<(), ApprenticeError> {
        check_trajectory(states.len(), actions.len())?;
        let n = self.env.action_space_size();
        let plies = actions.len();

        for (i, action) in actions.iter().enumerate() {
            // The final mover receives the terminal reward; signs alternate
            // walking back toward the start.
            let sign = if (plies - 1 - i) % 2 == 0 { 1.0 } else { -1.0 };
            let target = sign * terminal_reward;

            let entry = self
                .table
                .entry(Self::key(&states[i + 1]))
                .or_insert_with(TableEntry::default);
            entry.updates += 1;
            let step = self.learning_rate.max(1.0 / f64::from(entry.updates));
            entry.value += step * (target - entry.value);

            if let Some(index) = self.env.action_index(action).filter(|&index| index < n) {
                let entry = self
                    .table
                    .entry(Self::key(&states[i]))
                    .or_insert_with(TableEntry::default);
                if entry.action_counts.len() < n {
                    entry.action_counts.resize(n, 0);
                }
                entry.action_counts[index] += 1;
            }
        }
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), ApprenticeError> {
        let snapshot = TableSnapshot {
            action_space_size: self.env.action_space_size(),
            learning_rate: self.learning_rate,
            table: self.table.clone(),
        };
        std::fs::write(path, bincode::serialize(&snapshot)?)?;
        debug!(path = %path.display(), states = self.table.len(), "saved apprentice table");
        Ok(())
    }
}
