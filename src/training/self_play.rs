//! Self-play loop for training the apprentice.
//!
//! The runner plays the engine against itself one move per turn. Each move
//! comes from a root-parallel search over a tree that follows the game, so
//! statistics carry from move to move until the tree is periodically
//! cleared. When a game ends the apprentice trains on its trajectory and a
//! new game starts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::SearchRng;
use crate::mcts::{NodeId, ParallelSearch, SearchConfig, SearchError, SearchTree};
use crate::nn::Apprentice;
use crate::rules::Environment;

use super::trajectory::{GameOutcome, GameTally, Trajectory};

/// Budgets and intervals for self-play.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Search iterations per move.
    pub iterations_per_move: u32,

    /// Save the apprentice every this many turns (0 = never).
    pub save_interval: u32,

    /// Discard the search tree every this many turns (0 = never).
    pub clear_interval: u32,

    /// Moves after which an unfinished game is scored as a draw.
    pub max_turns: u32,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            iterations_per_move: 800,
            save_interval: 5,
            clear_interval: 5,
            max_turns: 50,
        }
    }
}

impl SelfPlayConfig {
    /// Same as `Default`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set search iterations per move.
    pub fn with_iterations_per_move(mut self, iterations: u32) -> Self {
        self.iterations_per_move = iterations;
        self
    }

    /// Set the model save interval.
    pub fn with_save_interval(mut self, turns: u32) -> Self {
        self.save_interval = turns;
        self
    }

    /// Set the tree clear interval.
    pub fn with_clear_interval(mut self, turns: u32) -> Self {
        self.clear_interval = turns;
        self
    }

    /// Moves after which an unfinished game is scored as a draw.
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }
}

/// A game being played.
struct GameInProgress<S, A> {
    trajectory: Trajectory<S, A>,
    tree: SearchTree<S>,
    node: NodeId,
}

/// Runs self-play turns against one environment.
///
/// A game left unfinished at the end of [`SelfPlayRunner::run`] resumes on
/// the next call.
pub struct SelfPlayRunner<'a, E: Environment> {
    /// The environment rules.
    env: &'a E,

    /// Position every game starts from.
    initial: E::State,

    /// Turn budgets and intervals.
    config: SelfPlayConfig,

    /// Search configuration for each move.
    search: SearchConfig,

    /// Where the apprentice is saved; `None` disables saving.
    model_path: Option<PathBuf>,

    rng: SearchRng,
    tally: GameTally,
    game: Option<GameInProgress<E::State, E::Action>>,
}

impl<'a, E: Environment> SelfPlayRunner<'a, E> {
    /// Create a new runner.
    pub fn new(env: &'a E, initial: E::State, config: SelfPlayConfig, search: SearchConfig) -> Self {
        let rng = SearchRng::new(search.seed);
        Self {
            env,
            initial,
            config,
            search,
            model_path: None,
            rng,
            tally: GameTally::default(),
            game: None,
        }
    }

    /// Save the apprentice to `path` at every save interval.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Use an existing RNG stream instead of one seeded from the config.
    pub fn with_rng(mut self, rng: SearchRng) -> Self {
        self.rng = rng;
        self
    }

    /// Games finished so far.
    #[must_use]
    pub fn tally(&self) -> GameTally {
        self.tally
    }

    /// Moves played in the current game, if one is in progress.
    #[must_use]
    pub fn current_game_len(&self) -> Option<usize> {
        self.game.as_ref().map(|g| g.trajectory.len())
    }

    /// Play `turns` moves, training `apprentice` after every finished game.
    ///
    /// Returns the outcomes of games finished during this call.
    pub fn run<P>(&mut self, apprentice: &mut P, turns: u32) -> Result<Vec<GameOutcome>, SearchError>
    where
        P: Apprentice<E::State, E::Action>,
    {
        let mut finished = Vec::new();

        for turn in 0..turns {
            if self.config.save_interval > 0 && turn % self.config.save_interval == 0 {
                self.save(&*apprentice)?;
            }
            if self.config.clear_interval > 0 && turn > 0 && turn % self.config.clear_interval == 0 {
                self.clear_tree();
            }

            if let Some(outcome) = self.turn(apprentice)? {
                finished.push(outcome);
            }
        }
        Ok(finished)
    }

    /// Play one move, finishing the game if it ends.
    fn turn<P>(&mut self, apprentice: &mut P) -> Result<Option<GameOutcome>, SearchError>
    where
        P: Apprentice<E::State, E::Action>,
    {
        let game = self.game.get_or_insert_with(|| {
            info!(games = self.tally.games(), "starting new self-play game");
            let tree = SearchTree::new(self.initial.clone());
            GameInProgress {
                trajectory: Trajectory::new(self.initial.clone()),
                node: tree.root(),
                tree,
            }
        });

        let mut search = ParallelSearch::new(self.env, &*apprentice, self.search.clone()).with_rng(self.rng.fork());
        let action = search.search(&mut game.tree, game.node, self.config.iterations_per_move)?;

        let next = self.env.transition(game.trajectory.last_state(), &action);
        debug!(ply = game.trajectory.len() + 1, ?action, "self-play move");
        game.node = game.tree.play(self.env, game.node, std::slice::from_ref(&action));
        game.trajectory.push(action, next);

        let state = game.trajectory.last_state();
        let reward = if self.env.is_terminal(state) {
            Some(self.env.reward(state).ok_or_else(|| SearchError::MissingReward(format!("{state:?}")))?)
        } else if game.trajectory.len() >= self.config.max_turns as usize {
            Some(0.0)
        } else {
            None
        };
        let Some(reward) = reward else {
            return Ok(None);
        };

        let Some(mut game) = self.game.take() else {
            return Ok(None);
        };
        game.trajectory.finish(reward);
        game.trajectory.train(apprentice)?;

        let outcome = game.trajectory.outcome().unwrap_or(GameOutcome::Draw);
        self.tally.record(outcome);
        info!(
            plies = game.trajectory.len(),
            ?outcome,
            tally = %self.tally,
            "self-play game finished"
        );
        Ok(Some(outcome))
    }

    /// Replace the current game's tree with a fresh one at the current position.
    fn clear_tree(&mut self) {
        if let Some(game) = &mut self.game {
            debug!(nodes = game.tree.len(), "clearing self-play tree");
            game.tree.reset(game.trajectory.last_state().clone());
            game.node = game.tree.root();
        }
    }

    fn save<P>(&self, apprentice: &P) -> Result<(), SearchError>
    where
        P: Apprentice<E::State, E::Action>,
    {
        if let Some(path) = &self.model_path {
            apprentice.save(path)?;
            info!(path = %path.display(), "saved apprentice");
        }
        Ok(())
    }
}
