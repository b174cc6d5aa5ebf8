//! Trajectory of one self-play game.
//!
//! A trajectory records every position of a game including the final one,
//! the actions between them, and the terminal reward once the game is over.
//! It is exactly what `Apprentice::train` consumes.

use serde::{Deserialize, Serialize};

use crate::nn::{Apprentice, ApprenticeError};

/// How a finished game ended, by seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// The player who moved first won.
    FirstPlayerWin,
    /// The player who moved second won.
    SecondPlayerWin,
    Draw,
}

/// A complete or in-progress self-play game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trajectory<S, A> {
    /// Positions in order, starting with the initial position.
    states: Vec<S>,

    /// Actions taken; `actions[i]` leads from `states[i]` to `states[i + 1]`.
    actions: Vec<A>,

    /// Reward of the final state for the player who moved into it.
    /// `None` while the game is in progress.
    terminal_reward: Option<f64>,
}

impl<S, A> Trajectory<S, A> {
    /// Start a trajectory at `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            states: vec![initial],
            actions: Vec::new(),
            terminal_reward: None,
        }
    }

    /// Record one move and the position it produced.
    pub fn push(&mut self, action: A, next: S) {
        debug_assert!(self.terminal_reward.is_none(), "push after finish");
        self.actions.push(action);
        self.states.push(next);
    }

    /// Mark the game as over with the final state's reward.
    pub fn finish(&mut self, terminal_reward: f64) {
        self.terminal_reward = Some(terminal_reward);
    }

    /// Number of moves played.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.terminal_reward.is_some()
    }

    #[must_use]
    pub fn states(&self) -> &[S] {
        &self.states
    }

    #[must_use]
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Current position.
    #[must_use]
    pub fn last_state(&self) -> &S {
        // `states` is never empty.
        &self.states[self.states.len() - 1]
    }

    #[must_use]
    pub fn terminal_reward(&self) -> Option<f64> {
        self.terminal_reward
    }

    /// Result by seat, once finished.
    ///
    /// A positive reward goes to whoever made the last move.
    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        let reward = self.terminal_reward?;
        if reward == 0.0 || self.actions.is_empty() {
            return Some(GameOutcome::Draw);
        }
        let last_mover_is_first = self.actions.len() % 2 == 1;
        Some(if (reward > 0.0) == last_mover_is_first {
            GameOutcome::FirstPlayerWin
        } else {
            GameOutcome::SecondPlayerWin
        })
    }

    /// Train `apprentice` on this game.
    ///
    /// Unfinished games are skipped.
    pub fn train<P>(&self, apprentice: &mut P) -> Result<bool, ApprenticeError>
    where
        P: Apprentice<S, A> + ?Sized,
    {
        match self.terminal_reward {
            Some(reward) => {
                apprentice.train(&self.states, &self.actions, reward)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Running count of finished games.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTally {
    pub first_player_wins: u32,
    pub second_player_wins: u32,
    pub draws: u32,
}

impl GameTally {
    pub fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::FirstPlayerWin => self.first_player_wins += 1,
            GameOutcome::SecondPlayerWin => self.second_player_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }

    /// Total games recorded.
    #[must_use]
    pub fn games(&self) -> u32 {
        self.first_player_wins + self.second_player_wins + self.draws
    }
}

impl std::fmt::Display for GameTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "first {} second {} draws {}",
            self.first_player_wins, self.second_player_wins, self.draws
        )
    }
}
