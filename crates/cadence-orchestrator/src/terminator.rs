//! Process termination seam.

use std::sync::{Arc, Mutex, PoisonError};

use cadence_utils::ExitCode;
use tracing::info;

/// Ends the process once an interrupted run has shut down.
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: ExitCode);
}

/// Exits the real process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: ExitCode) {
        info!(code = code.as_i32(), "Terminating after interrupt");
        std::process::exit(code.as_i32());
    }
}

/// Records requested exit codes instead of exiting.
#[derive(Debug, Default, Clone)]
pub struct RecordingTerminator {
    codes: Arc<Mutex<Vec<ExitCode>>>,
}

impl RecordingTerminator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn codes(&self) -> Vec<ExitCode> {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn terminated(&self) -> bool {
        !self.codes().is_empty()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: ExitCode) {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(code);
    }
}
