//! Monte Carlo Tree Search guided by an apprentice.
//!
//! ## Overview
//!
//! - **Arena tree**: Nodes live in a flat arena and reference each other by
//!   `NodeId`; reclaimed subtrees return their slots to a free list
//! - **UCT with a learned bias**: Selection adds half the apprentice's
//!   evaluation of each child to the usual UCT score
//! - **Rollouts**: Uniform random, or sampled from the apprentice with a
//!   bounded retry budget before falling back to uniform
//! - **Root parallelism**: Workers search private copies of the tree which
//!   are merged back by state
//! - **Replay**: Trees follow the real game so statistics carry over
//!
//! ## Usage
//!
//! ```rust
//! use apprentice_mcts::games::TicTacToe;
//! use apprentice_mcts::mcts::{ParallelSearch, SearchConfig, SearchTree};
//! use apprentice_mcts::nn::UniformApprentice;
//!
//! let env = TicTacToe::new();
//! let apprentice = UniformApprentice::new(9);
//! let mut tree = SearchTree::new(env.initial_state());
//! let root = tree.root();
//!
//! let mut search = ParallelSearch::new(&env, &apprentice, SearchConfig::default().with_workers(2));
//! let action = search.search(&mut tree, root, 500).unwrap();
//! println!("best move: {action}");
//!
//! // Keep the statistics for the move that was actually played.
//! let next = tree.play(&env, root, &[action]);
//! assert_eq!(tree.get(next).depth, 1);
//! ```

pub mod backprop;
pub mod config;
pub mod error;
pub mod expand;
pub mod merge;
pub mod node;
pub mod parallel;
pub mod policy;
pub mod replay;
pub mod search;
pub mod stats;
pub mod tree;

// Re-export main types
pub use backprop::backpropagate;
pub use config::{RolloutKind, SearchConfig};
pub use error::SearchError;
pub use expand::expand;
pub use node::{NodeId, SearchNode};
pub use parallel::{split_iterations, ParallelSearch};
pub use policy::{GuidedRollout, Rollout, RolloutPolicy, UctSelector, UniformRollout};
pub use search::{best_action, SequentialSearcher};
pub use stats::SearchStats;
pub use tree::{SearchTree, TreeStats};
