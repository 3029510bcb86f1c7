//! Interrupt cleanup policy.

use std::time::Duration;

use cadence_config::Config;

/// How long an interrupted command may spend in `on_interrupt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptPolicy {
    /// `None` waits for the hook however long it takes. `Some(d)` forces
    /// termination with exit code 124 once `d` elapses.
    pub grace_period: Option<Duration>,
}

impl InterruptPolicy {
    /// Wait indefinitely.
    #[must_use]
    pub fn unbounded() -> Self {
        Self { grace_period: None }
    }

    #[must_use]
    pub fn bounded(grace: Duration) -> Self {
        Self {
            grace_period: Some(grace),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            grace_period: config.grace_period(),
        }
    }
}
