//! Configuration for cadence
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > config file > built-in defaults.

mod config;

pub use config::*;
