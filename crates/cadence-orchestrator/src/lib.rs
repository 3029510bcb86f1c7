//! Command lifecycle orchestration for cadence
//!
//! [`CliOrchestrator`] drives one command through
//! `INIT -> RESOLVING_COMMAND -> BEFORE_RUN -> RUNNING -> (COMPLETING | INTERRUPTING) -> SHUTDOWN -> DONE`,
//! timing each instrumentation phase and deferring process termination
//! until an interrupted command has finished its cleanup.

mod orchestrator;
mod policy;
mod state;
mod terminator;

pub use orchestrator::CliOrchestrator;
pub use policy::InterruptPolicy;
pub use state::RunState;
pub use terminator::{ProcessTerminator, RecordingTerminator, Terminator};

pub use cadence_utils::error::{CadenceError, ErrorKind};
