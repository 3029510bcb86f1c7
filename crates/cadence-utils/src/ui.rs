//! User-facing console output.
//!
//! Commands and tasks print through a [`Ui`] instead of `println!` so the
//! orchestrator and tests can capture what a user would see.

use std::sync::{Arc, Mutex};

/// Where user-visible lines go.
pub trait Ui: Send + Sync {
    /// Write a line of normal output.
    fn write_line(&self, line: &str);

    /// Write a line of error output.
    fn write_error_line(&self, line: &str);
}

/// Shared handle to a [`Ui`] implementation.
pub type SharedUi = Arc<dyn Ui>;

/// Writes to the process stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleUi;

impl Ui for ConsoleUi {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }

    fn write_error_line(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// Collects output in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferUi {
    output: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl BufferUi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All normal output joined with newlines.
    #[must_use]
    pub fn output(&self) -> String {
        self.output
            .lock()
            .map(|lines| lines.join("\n"))
            .unwrap_or_default()
    }

    /// All error output joined with newlines.
    #[must_use]
    pub fn errors(&self) -> String {
        self.errors
            .lock()
            .map(|lines| lines.join("\n"))
            .unwrap_or_default()
    }
}

impl Ui for BufferUi {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.output.lock() {
            lines.push(line.to_string());
        }
    }

    fn write_error_line(&self, line: &str) {
        if let Ok(mut lines) = self.errors.lock() {
            lines.push(line.to_string());
        }
    }
}
