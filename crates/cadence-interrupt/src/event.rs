//! Interrupt events and their conventional exit codes.

use std::fmt;

use cadence_utils::ExitCode;

/// Byte a raw-mode terminal delivers for Ctrl-C.
pub const CONTROL_BYTE: u8 = 0x03;

/// An out-of-band request for the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptEvent {
    /// Terminal interrupt (SIGINT / Ctrl-C).
    Interrupt,
    /// Termination requested by the parent process (SIGTERM).
    Terminate,
    /// `0x03` read from a raw-mode stdin.
    ControlByte,
    /// Someone asked the process to exit with `code`.
    ExitRequested { code: i32 },
}

impl InterruptEvent {
    /// Exit code the process should end with after handling this event.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Interrupt | Self::ControlByte => ExitCode::INTERRUPTED,
            Self::Terminate => ExitCode::TERMINATED,
            Self::ExitRequested { code } => ExitCode::from_i32(*code),
        }
    }

    /// Short name used in logs and error messages.
    #[must_use]
    pub fn signal_name(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::ControlByte => "control byte",
            Self::ExitRequested { .. } => "exit request",
        }
    }
}

impl fmt::Display for InterruptEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitRequested { code } => write!(f, "exit request (code {code})"),
            other => f.write_str(other.signal_name()),
        }
    }
}

/// Number of interrupt bytes in a chunk read from a raw terminal.
#[must_use]
pub fn control_bytes(chunk: &[u8]) -> usize {
    chunk.iter().filter(|&&b| b == CONTROL_BYTE).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_shell_conventions() {
        assert_eq!(InterruptEvent::Interrupt.exit_code(), ExitCode::INTERRUPTED);
        assert_eq!(InterruptEvent::ControlByte.exit_code(), ExitCode::INTERRUPTED);
        assert_eq!(InterruptEvent::Terminate.exit_code(), ExitCode::TERMINATED);
        assert_eq!(
            InterruptEvent::ExitRequested { code: 7 }.exit_code().as_i32(),
            7
        );
    }

    #[test]
    fn test_control_bytes_counts_only_etx() {
        assert_eq!(control_bytes(b"abc"), 0);
        assert_eq!(control_bytes(&[0x03]), 1);
        assert_eq!(control_bytes(&[b'q', 0x03, b'\n', 0x03]), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(InterruptEvent::Interrupt.to_string(), "SIGINT");
        assert_eq!(
            InterruptEvent::ExitRequested { code: 2 }.to_string(),
            "exit request (code 2)"
        );
    }
}
