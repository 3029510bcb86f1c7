//! External tasks run by cadence commands
//!
//! A task wraps one package-manager subprocess: it builds an argv-style
//! invocation, relays the child's output line by line, and can be cancelled
//! from another task (typically a command's `on_interrupt` hook).

mod control;
mod package_manager;
mod platform;
mod spec;

pub use control::{TaskControl, TaskState};
pub use package_manager::{LogLine, PackageManagerTask, Stream, TaskOptions, TaskOutcome};
pub use spec::TaskSpec;

pub use cadence_utils::error::TaskError;
