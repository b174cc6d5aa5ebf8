//! Self-play training for the apprentice.
//!
//! ## Overview
//!
//! - **Trajectory**: Every position and action of one game plus its reward
//! - **SelfPlayRunner**: Plays the engine against itself and trains the
//!   apprentice on each finished game
//! - **GameTally**: Wins by seat and draws
//!
//! ## Usage
//!
//! ```rust
//! use apprentice_mcts::games::TicTacToe;
//! use apprentice_mcts::mcts::SearchConfig;
//! use apprentice_mcts::nn::TabularApprentice;
//! use apprentice_mcts::training::{SelfPlayConfig, SelfPlayRunner};
//!
//! let env = TicTacToe::new();
//! let mut apprentice = TabularApprentice::new(env);
//! let config = SelfPlayConfig::default().with_iterations_per_move(50);
//! let mut runner = SelfPlayRunner::new(&env, env.initial_state(), config, SearchConfig::default());
//!
//! runner.run(&mut apprentice, 10).unwrap();
//! println!("{}", runner.tally());
//! ```

pub mod self_play;
pub mod trajectory;

// Re-export main types
pub use self_play::{SelfPlayConfig, SelfPlayRunner};
pub use trajectory::{GameOutcome, GameTally, Trajectory};
