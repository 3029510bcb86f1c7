//! cadence-utils - foundation utilities shared by every cadence crate
//!
//! Error taxonomy, exit codes, tracing setup, console output, atomic
//! file writes and the anchor-based text insertion utility.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod insertion;
pub mod logging;
pub mod ui;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use error::{CadenceError, ErrorCategory, UserFriendlyError};
pub use exit_codes::ExitCode;
