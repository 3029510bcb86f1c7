//! The `Command` capability trait and its output.

use async_trait::async_trait;
use cadence_utils::ExitCode;

use crate::context::CommandContext;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: ExitCode,
    pub message: Option<String>,
}

impl CommandOutput {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// A run that completed but wants a non-zero exit.
    #[must_use]
    pub fn with_code(exit_code: ExitCode) -> Self {
        Self {
            exit_code,
            message: None,
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A unit of work bound to a user-facing verb.
///
/// Hooks that a command does not override are immediate no-ops. When an
/// interrupt arrives, `on_interrupt` runs alongside `run`, which may observe
/// [`CommandContext::interrupted`] to wind down. A `run` still pending once
/// `on_interrupt` settles is dropped.
#[async_trait]
pub trait Command: Send + Sync {
    /// Registry key and instrumentation label.
    fn name(&self) -> &str;

    /// One line for help output.
    fn description(&self) -> &str {
        ""
    }

    async fn before_run(&self, _ctx: &CommandContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<CommandOutput>;

    /// Cleanup after an external interrupt. Invoked at most once per run and
    /// awaited before the process exits.
    async fn on_interrupt(&self, _ctx: &CommandContext) -> anyhow::Result<()> {
        Ok(())
    }
}
