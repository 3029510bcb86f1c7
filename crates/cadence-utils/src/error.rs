//! Error types
//!
//! Typed errors for each cadence component plus [`CadenceError`], the
//! aggregate returned by the orchestrator, and the user-facing rendering
//! used by the binary.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `CadenceError` is the single structured outcome every failed run is
/// folded into. It provides:
/// - A stable [`ErrorKind`] so callers can tell an interruption from a
///   command failure from an unknown command
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Error Categories
///
/// | Variant | Kind | Description |
/// |---------|------|-------------|
/// | `CommandNotFound` | `notFound` | No registered command matched the first argument |
/// | `HookFailure` | `commandError` | `before_run` or `run` returned an error |
/// | `Interrupted` | `interrupted` | An interrupt was delivered while the command ran |
/// | `InterruptTimeout` | `interruptTimeout` | Interrupt cleanup outlived the grace period |
/// | `CoordinatorMisuse` | `misuse` | Interrupt coordinator invariant violated |
/// | `Instrumentation` | `misuse` | Phase discipline violated |
/// | `Config` | `config` | Configuration file or CLI argument errors |
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes.
///
/// # Example
///
/// ```rust
/// use cadence_utils::error::CadenceError;
///
/// let err = CadenceError::CommandNotFound {
///     name: "deploy".to_string(),
///     available: vec!["clean".to_string(), "install".to_string()],
/// };
/// assert_eq!(err.to_exit_code().as_i32(), 3);
/// assert_eq!(err.kind().as_str(), "notFound");
/// ```
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("The specified command {name} is invalid")]
    CommandNotFound { name: String, available: Vec<String> },

    #[error("Command '{command}' failed during {stage}: {error:#}")]
    HookFailure {
        command: String,
        stage: HookStage,
        error: anyhow::Error,
    },

    #[error("Command '{command}' was interrupted by {signal}")]
    Interrupted {
        command: String,
        signal: String,
        exit_code: i32,
    },

    #[error("Interrupt cleanup for '{command}' did not finish within {}s", .grace.as_secs_f64())]
    InterruptTimeout { command: String, grace: Duration },

    #[error("Interrupt coordinator misuse: {0}")]
    CoordinatorMisuse(#[from] InterruptError),

    #[error("Instrumentation misuse: {0}")]
    Instrumentation(#[from] InstrumentationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Text insertion error: {0}")]
    Insert(#[from] InsertError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which command hook produced a [`CadenceError::HookFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    BeforeRun,
    Run,
    OnInterrupt,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeRun => write!(f, "before_run"),
            Self::Run => write!(f, "run"),
            Self::OnInterrupt => write!(f, "on_interrupt"),
        }
    }
}

/// Stable, machine-readable classification of a [`CadenceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    CommandError,
    Interrupted,
    InterruptTimeout,
    Misuse,
    Config,
    Io,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "notFound",
            Self::CommandError => "commandError",
            Self::Interrupted => "interrupted",
            Self::InterruptTimeout => "interruptTimeout",
            Self::Misuse => "misuse",
            Self::Config => "config",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    CommandExecution,
    Interruption,
    FileSystem,
    Integration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::CommandExecution => write!(f, "Command Execution"),
            Self::Interruption => write!(f, "Interruption"),
            Self::FileSystem => write!(f, "File System"),
            Self::Integration => write!(f, "Integration"),
        }
    }
}

/// Interrupt coordinator invariant violations.
///
/// These are programmer errors: they indicate the coordinator was wired
/// incorrectly, not that a user did something wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterruptError {
    #[error("signal source is already captured; release it before capturing again")]
    AlreadyCapturing,

    #[error("no signal source is captured")]
    NotCapturing,

    #[error("failed to subscribe to process signals: {reason}")]
    SignalSetup { reason: String },
}

/// Phase discipline violations detected by instrumentation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentationError {
    #[error("phase '{phase}' was started twice without an intervening stop")]
    AlreadyStarted { phase: String },

    #[error("phase '{phase}' was stopped but never started")]
    NotStarted { phase: String },

    #[error("phase '{phase}' was already stopped")]
    AlreadyStopped { phase: String },

    #[error("phase '{phase}' started before '{previous}' completed")]
    OutOfOrder { phase: String, previous: String },

    #[error("report requested before phase '{phase}' completed")]
    Incomplete { phase: String },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Invalid command arguments: {0}")]
    InvalidArguments(String),
}

/// Text insertion errors (file-backed variant only; string insertion is infallible)
#[derive(Error, Debug)]
pub enum InsertError {
    #[error("failed to read {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    #[error("failed to write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    #[error("invalid marker pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors from external tasks (package-manager subprocesses and file cleanup)
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("`{program} {subcommand}` not found")]
    CommandNotFound { program: String, subcommand: String },

    #[error("`{program} {subcommand}` exited with code {code}")]
    ExitStatus {
        program: String,
        subcommand: String,
        code: i32,
    },

    #[error("`{program} {subcommand}` was cancelled")]
    Cancelled { program: String, subcommand: String },

    #[error("task spawn failed: {reason}")]
    SpawnFailed { reason: String },

    #[error("failed to remove {}: {reason}", .path.display())]
    RemoveFailed { path: PathBuf, reason: String },
}

impl UserFriendlyError for InterruptError {
    fn user_message(&self) -> String {
        match self {
            Self::AlreadyCapturing => {
                "The interrupt coordinator was captured twice without being released".to_string()
            }
            Self::NotCapturing => "The interrupt coordinator is not capturing signals".to_string(),
            Self::SignalSetup { reason } => format!("Could not install signal handlers: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::AlreadyCapturing | Self::NotCapturing => Some(
                "Capture and release must be strictly paired around one run at a time.".to_string(),
            ),
            Self::SignalSetup { .. } => {
                Some("The host environment refused signal registration.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AlreadyCapturing | Self::NotCapturing => vec![
                "Hold the CaptureGuard for the lifetime of the program".to_string(),
                "Do not run two orchestrators concurrently in one process".to_string(),
            ],
            Self::SignalSetup { .. } => vec![
                "Check whether the process runs inside a restricted sandbox".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Integration
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => format!("Configuration file is invalid: {reason}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration value '{value}' is not valid for '{key}'")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::InvalidArguments(reason) => format!("Invalid arguments: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) | Self::InvalidValue { .. } => Some(
                "Configuration is read from .cadence/config.toml, discovered upward from the current directory.".to_string(),
            ),
            Self::NotFound { .. } => {
                Some("An explicit --config path must point to an existing file.".to_string())
            }
            Self::InvalidArguments(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Remove unknown sections or keys".to_string(),
            ],
            Self::InvalidValue { key, .. } => {
                vec![format!("Fix or remove the '{key}' setting")]
            }
            Self::NotFound { .. } => vec!["Verify the path passed to --config".to_string()],
            Self::InvalidArguments(_) => vec!["Run with --help to see usage".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for TaskError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::CommandNotFound { program, .. } => {
                Some(format!("'{program}' could not be located on PATH."))
            }
            Self::ExitStatus { .. } => {
                Some("The package manager reported a failure; see its output above.".to_string())
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::CommandNotFound { program, .. } => vec![
                format!("Install {program} or set [tasks] package_manager in .cadence/config.toml"),
            ],
            Self::ExitStatus { .. } => vec!["Re-run with --verbose to see the full output".to_string()],
            Self::RemoveFailed { .. } => vec!["Check file and directory permissions".to_string()],
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::RemoveFailed { .. } => ErrorCategory::FileSystem,
            _ => ErrorCategory::CommandExecution,
        }
    }
}

impl UserFriendlyError for CadenceError {
    fn user_message(&self) -> String {
        match self {
            Self::CommandNotFound { name, .. } => {
                format!("The specified command {name} is invalid")
            }
            Self::HookFailure { error, .. } => format!("{error:#}"),
            Self::Interrupted { command, signal, .. } => {
                format!("'{command}' was interrupted ({signal}); cleanup finished")
            }
            Self::InterruptTimeout { command, grace } => format!(
                "'{command}' did not finish its cleanup within {}s and was terminated",
                grace.as_secs_f64()
            ),
            Self::CoordinatorMisuse(err) => err.user_message(),
            Self::Instrumentation(err) => format!("Internal phase tracking error: {err}"),
            Self::Config(err) => err.user_message(),
            Self::Insert(err) => err.to_string(),
            Self::Task(err) => err.user_message(),
            Self::Io(err) => format!("File system operation failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::CommandNotFound { available, .. } if !available.is_empty() => {
                Some(format!("Available commands: {}", available.join(", ")))
            }
            Self::CommandNotFound { .. } => None,
            Self::HookFailure { command, stage, .. } => {
                Some(format!("The failure happened in the {stage} hook of '{command}'."))
            }
            Self::Interrupted { .. } => None,
            Self::InterruptTimeout { .. } => Some(
                "The interrupt grace period bounds how long cleanup may run after a signal.".to_string(),
            ),
            Self::CoordinatorMisuse(err) => err.context(),
            Self::Instrumentation(_) => {
                Some("Phases must run init, command, shutdown in order, once each.".to_string())
            }
            Self::Config(err) => err.context(),
            Self::Insert(_) => None,
            Self::Task(err) => err.context(),
            Self::Io(_) => {
                Some("This usually indicates a permissions issue or disk space problem.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::CommandNotFound { .. } => {
                vec!["Run `cadence help` to list the available commands".to_string()]
            }
            Self::HookFailure { .. } => {
                vec!["Re-run with --verbose for more detailed output".to_string()]
            }
            Self::Interrupted { .. } => Vec::new(),
            Self::InterruptTimeout { .. } => vec![
                "Increase [interrupt] grace_period_secs in .cadence/config.toml".to_string(),
                "Pass --grace-period to allow a longer cleanup".to_string(),
            ],
            Self::CoordinatorMisuse(err) => err.suggestions(),
            Self::Instrumentation(_) => {
                vec!["Report this as a bug; it indicates an orchestration defect".to_string()]
            }
            Self::Config(err) => err.suggestions(),
            Self::Insert(_) => Vec::new(),
            Self::Task(err) => err.suggestions(),
            Self::Io(_) => vec![
                "Check file and directory permissions".to_string(),
                "Ensure sufficient disk space is available".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::CommandNotFound { .. } | Self::Config(_) => ErrorCategory::Configuration,
            Self::HookFailure { .. } => ErrorCategory::CommandExecution,
            Self::Interrupted { .. } | Self::InterruptTimeout { .. } => ErrorCategory::Interruption,
            Self::CoordinatorMisuse(_) | Self::Instrumentation(_) => ErrorCategory::Integration,
            Self::Insert(_) | Self::Io(_) => ErrorCategory::FileSystem,
            Self::Task(err) => err.category(),
        }
    }
}

impl CadenceError {
    /// Classify this error for programmatic handling.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CommandNotFound { .. } => ErrorKind::NotFound,
            Self::HookFailure { .. } | Self::Task(_) | Self::Insert(_) => ErrorKind::CommandError,
            Self::Interrupted { .. } => ErrorKind::Interrupted,
            Self::InterruptTimeout { .. } => ErrorKind::InterruptTimeout,
            Self::CoordinatorMisuse(_) | Self::Instrumentation(_) => ErrorKind::Misuse,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// The error a command hook returned, if this is a hook failure.
    #[must_use]
    pub fn command_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::HookFailure { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Invariant violations are unrecoverable integration faults.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        self.kind() == ErrorKind::Misuse
    }

    /// Get a user-friendly error message with context and actionable suggestions.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    ///
    /// This is the single source of truth for process exit codes.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            CadenceError::CommandNotFound { .. } => ExitCode::COMMAND_NOT_FOUND,
            CadenceError::Config(_) => ExitCode::CLI_ARGS,
            CadenceError::Interrupted { exit_code, .. } => ExitCode::from_i32(*exit_code),
            CadenceError::InterruptTimeout { .. } => ExitCode::INTERRUPT_TIMEOUT,
            CadenceError::Task(TaskError::ExitStatus { code, .. }) if *code != 0 => {
                ExitCode::from_i32(*code)
            }
            CadenceError::HookFailure { error, .. } => match error.downcast_ref::<TaskError>() {
                Some(TaskError::ExitStatus { code, .. }) if *code != 0 => ExitCode::from_i32(*code),
                _ => ExitCode::INTERNAL,
            },
            _ => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("OMG")]
    struct Boom;

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(ErrorKind::NotFound.as_str(), "notFound");
        assert_eq!(ErrorKind::CommandError.as_str(), "commandError");
        assert_eq!(ErrorKind::Interrupted.as_str(), "interrupted");
        assert_eq!(ErrorKind::InterruptTimeout.to_string(), "interruptTimeout");
    }

    #[test]
    fn test_hook_failure_preserves_original_error() {
        let err = CadenceError::HookFailure {
            command: "fake".to_string(),
            stage: HookStage::Run,
            error: anyhow::Error::new(Boom),
        };

        assert_eq!(err.kind(), ErrorKind::CommandError);
        assert!(err.command_error().unwrap().downcast_ref::<Boom>().is_some());
        assert_eq!(err.to_exit_code().as_i32(), 1);
        assert!(err.to_string().contains("OMG"));
    }

    #[test]
    fn test_interrupted_exit_code_comes_from_signal() {
        let err = CadenceError::Interrupted {
            command: "serve".to_string(),
            signal: "SIGTERM".to_string(),
            exit_code: 143,
        };
        assert_eq!(err.to_exit_code().as_i32(), 143);
        assert_eq!(err.category(), ErrorCategory::Interruption);
    }

    #[test]
    fn test_misuse_is_flagged() {
        let err: CadenceError = InterruptError::AlreadyCapturing.into();
        assert!(err.is_misuse());

        let err: CadenceError = InstrumentationError::NotStarted {
            phase: "init".to_string(),
        }
        .into();
        assert!(err.is_misuse());
    }

    #[test]
    fn test_display_for_user_lists_available_commands() {
        let err = CadenceError::CommandNotFound {
            name: "deploy".to_string(),
            available: vec!["clean".to_string(), "install".to_string()],
        };
        let rendered = err.display_for_user();

        assert!(rendered.starts_with("Error: The specified command deploy is invalid"));
        assert!(rendered.contains("Available commands: clean, install"));
        assert!(rendered.contains("Suggestions:"));
    }

    #[test]
    fn test_interrupt_timeout_message() {
        let err = CadenceError::InterruptTimeout {
            command: "install".to_string(),
            grace: Duration::from_millis(1500),
        };
        assert!(err.to_string().contains("1.5s"));
        assert_eq!(err.to_exit_code().as_i32(), 124);
    }
}
