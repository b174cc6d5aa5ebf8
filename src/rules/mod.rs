//! Environment contract for domain implementations.
//!
//! Domains implement `Environment` to define:
//! - Legal actions for each state
//! - How actions produce successor states
//! - Terminal states and their rewards
//!
//! The search engine calls into `Environment` but never interprets
//! domain-specific concepts directly.

pub mod environment;

pub use environment::Environment;
