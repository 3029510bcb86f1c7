//! Command-line interface for cadence
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions (clap)
//! - `run`: Main entry point and orchestrator wiring
//! - `commands`: Built-in command implementations

pub mod args;
pub mod commands;
mod run;

pub use args::Cli;
pub use commands::builtin_registry;
pub use run::{execute, run};
