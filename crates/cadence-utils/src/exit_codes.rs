//! Exit code constants for cadence.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Command completed successfully |
//! | 1 | `INTERNAL` | Command failure or internal error |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `COMMAND_NOT_FOUND` | No registered command matched |
//! | 124 | `INTERRUPT_TIMEOUT` | Interrupt cleanup exceeded the grace period |
//! | 130 | `INTERRUPTED` | Terminal interrupt (Ctrl-C or raw control byte) |
//! | 143 | `TERMINATED` | Termination requested by the parent process |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants for common exit codes, or [`as_i32()`](Self::as_i32)
/// to get the numeric value for `std::process::exit()`.
///
/// # Example
///
/// ```rust
/// use cadence_utils::ExitCode;
///
/// let code = ExitCode::INTERRUPTED;
/// assert_eq!(code.as_i32(), 130);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from_i32(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - command completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - command failure or general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Command not found - the first positional argument matched no command
    pub const COMMAND_NOT_FOUND: ExitCode = ExitCode(3);

    /// Interrupt timeout - cleanup outlived the configured grace period
    pub const INTERRUPT_TIMEOUT: ExitCode = ExitCode(124);

    /// Interrupted - SIGINT / Ctrl-C / raw 0x03 on stdin
    pub const INTERRUPTED: ExitCode = ExitCode(130);

    /// Terminated - SIGTERM from the parent process
    pub const TERMINATED: ExitCode = ExitCode(143);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
