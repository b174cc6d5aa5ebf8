//! # apprentice-mcts
//!
//! Monte Carlo Tree Search guided by a learned apprentice, with root
//! parallelism, self-play training, and a UCI-style command protocol.
//!
//! ## Design Principles
//!
//! 1. **Domain-Agnostic**: Search sees states and actions only through the
//!    `Environment` trait and compares states with `==`.
//!
//! 2. **Two-Player Zero-Sum**: Rewards belong to the player who moved into
//!    a state; backpropagation flips the sign at every ply.
//!
//! 3. **Owned Trees**: The caller owns the search tree, so statistics
//!    survive between searches and follow the game via replay.
//!
//! ## Architecture
//!
//! - **Arena Tree**: Nodes in a flat `Vec` with `NodeId` links; whole
//!   subtrees are reclaimed onto a free list.
//!
//! - **Root Parallelism**: Workers search private copies and merge them by
//!   state, so the search needs no locks.
//!
//! - **Forked RNG**: One seed per process; every worker and self-play move
//!   takes a fork, making runs reproducible.
//!
//! ## Modules
//!
//! - `core`: RNG and engine configuration
//! - `rules`: `Environment` trait for domains
//! - `nn`: `Apprentice` trait and implementations
//! - `mcts`: Search tree, policies, sequential and parallel search
//! - `training`: Trajectories and the self-play loop
//! - `protocol`: Command parsing and the protocol session
//! - `games`: Example environments

pub mod core;
pub mod games;
pub mod mcts;
pub mod nn;
pub mod protocol;
pub mod rules;
pub mod training;

// Re-export commonly used types
pub use crate::core::{ConfigError, EngineConfig, ProtocolConfig, SearchRng};

pub use crate::rules::Environment;

pub use crate::nn::{Apprentice, ApprenticeError, TabularApprentice, UniformApprentice};

pub use crate::mcts::{
    best_action, GuidedRollout, NodeId, ParallelSearch, Rollout, RolloutKind, RolloutPolicy,
    SearchConfig, SearchError, SearchNode, SearchStats, SearchTree, SequentialSearcher,
    TreeStats, UctSelector, UniformRollout,
};

pub use crate::training::{GameOutcome, GameTally, SelfPlayConfig, SelfPlayRunner, Trajectory};

pub use crate::protocol::{Command, CommandError, Control, ProtocolError, UciSession};
