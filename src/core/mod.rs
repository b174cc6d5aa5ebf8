//! Core engine types: RNG and configuration.
//!
//! This module contains the building blocks shared by search, training and
//! the protocol driver. They know nothing about any particular domain.

pub mod config;
pub mod rng;

pub use config::{ConfigError, EngineConfig, ProtocolConfig};
pub use rng::SearchRng;
