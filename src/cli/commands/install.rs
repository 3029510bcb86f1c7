//! Install command implementation
//!
//! Handles `cadence install`: runs the configured package manager's
//! `install` subcommand. An interrupt cancels the subprocess and waits for
//! it to exit before the process terminates.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cadence_command::{Command, CommandContext, CommandOutput};
use cadence_tasks::{PackageManagerTask, TaskControl, TaskOptions, TaskOutcome};
use clap::Parser;
use tracing::info;

use super::{Parsed, parse_args};

#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Install project dependencies with the configured package manager")]
struct InstallArgs {
    /// Show what would run without spawning the package manager
    #[arg(long)]
    dry_run: bool,

    /// Relay package manager output
    #[arg(short, long)]
    verbose: bool,

    /// Packages and extra arguments passed through to the package manager
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    packages: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InstallCommand {
    args: OnceLock<Parsed<InstallArgs>>,
    control: TaskControl,
}

impl InstallCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Command for InstallCommand {
    fn name(&self) -> &str {
        "install"
    }

    fn description(&self) -> &str {
        "Install dependencies with the configured package manager"
    }

    async fn before_run(&self, ctx: &CommandContext) -> Result<()> {
        let parsed = parse_args(self.name(), &ctx.args)?;
        let _ = self.args.set(parsed);
        Ok(())
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutput> {
        let args = match self.args.get().context("install arguments were not parsed")? {
            Parsed::Args(args) => args,
            Parsed::Help(help) => return Ok(CommandOutput::success().message(help.clone())),
        };

        let manager = ctx.config.package_manager();
        let task = PackageManagerTask::new(manager, "install", ctx.ui.clone())
            .start_progress_message(format!("Installing packages with {manager}..."))
            .completion_message("Installed packages.")
            .cwd(ctx.project_root())
            .with_control(self.control.clone());
        let options = TaskOptions {
            verbose: args.verbose || ctx.config.verbose(),
            dry_run: args.dry_run,
            args: args.packages.clone(),
        };

        let outcome = task.run(&options).await?;
        let message = match outcome {
            TaskOutcome::DryRun { spec } => Some(format!("Dry run: would run `{spec}`")),
            TaskOutcome::Completed { log } => {
                info!(manager, lines = log.len(), "Install finished");
                None
            }
        };
        Ok(CommandOutput {
            message,
            ..CommandOutput::success()
        })
    }

    async fn on_interrupt(&self, _ctx: &CommandContext) -> Result<()> {
        self.control.cancel();
        self.control.wait_settled().await;
        Ok(())
    }
}
