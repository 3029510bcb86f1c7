//! The command contract
//!
//! A [`Command`] is one user-facing verb: an optional `before_run` hook, a
//! required `run`, and an optional `on_interrupt` cleanup hook. Commands are
//! looked up by exact name in a [`CommandRegistry`].

mod command;
mod context;
mod registry;

pub use command::{Command, CommandOutput};
pub use context::CommandContext;
pub use registry::{CommandFactory, CommandRegistry};
