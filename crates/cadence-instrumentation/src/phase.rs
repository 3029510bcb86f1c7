use std::fmt;

use serde::{Deserialize, Serialize};

/// One timed span of the run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentationPhase {
    Init,
    Command,
    Shutdown,
}

impl InstrumentationPhase {
    /// All phases in run order.
    pub const ALL: [InstrumentationPhase; 3] = [Self::Init, Self::Command, Self::Shutdown];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Command => "command",
            Self::Shutdown => "shutdown",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Init => 0,
            Self::Command => 1,
            Self::Shutdown => 2,
        }
    }

    /// The phase that must have stopped before this one may start.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Init => None,
            Self::Command => Some(Self::Init),
            Self::Shutdown => Some(Self::Command),
        }
    }
}

impl fmt::Display for InstrumentationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
