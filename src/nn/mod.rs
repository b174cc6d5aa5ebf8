//! Apprentice integration.
//!
//! The apprentice is the learned component that guides search and is
//! trained from self-play.
//!
//! ## Overview
//!
//! - **Trait**: `Apprentice` (action distribution, evaluation, training, save)
//! - **Baseline**: `UniformApprentice` for testing
//! - **Tabular**: `TabularApprentice`, a persistable per-state table
//!
//! ## Usage
//!
//! ```rust
//! use apprentice_mcts::games::TicTacToe;
//! use apprentice_mcts::nn::{Apprentice, TabularApprentice};
//!
//! let env = TicTacToe::new();
//! let apprentice = TabularApprentice::new(env);
//!
//! let probs = apprentice.action_distribution(&env.initial_state());
//! assert_eq!(probs.len(), 9);
//! assert_eq!(apprentice.evaluate(&env.initial_state()), 0.0);
//! ```

pub mod tabular;
pub mod traits;

// Re-export main types
pub use tabular::TabularApprentice;
pub use traits::{Apprentice, ApprenticeError, UniformApprentice};
