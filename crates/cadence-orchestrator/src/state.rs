use std::fmt;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Init,
    ResolvingCommand,
    BeforeRun,
    Running,
    Completing,
    Interrupting,
    Shutdown,
    /// Terminal: the run finished, was interrupted, or named no command.
    Done,
    /// Terminal: a hook failed.
    Crashed,
}

impl RunState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ResolvingCommand => "resolving_command",
            Self::BeforeRun => "before_run",
            Self::Running => "running",
            Self::Completing => "completing",
            Self::Interrupting => "interrupting",
            Self::Shutdown => "shutdown",
            Self::Done => "done",
            Self::Crashed => "crashed",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Crashed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
