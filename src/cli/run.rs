//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds `CliArgs` and discovers `Config`
//! - Installs tracing and creates a current-thread tokio runtime
//! - Captures process signals and hands the command to the orchestrator
//! - Handles all error output not already printed by the orchestrator

use std::sync::Arc;

use cadence_command::CommandRegistry;
use cadence_config::Config;
use cadence_interrupt::{InterruptCoordinator, ProcessSignalSource};
use cadence_orchestrator::CliOrchestrator;
use cadence_utils::error::{CadenceError, ErrorKind};
use cadence_utils::logging::init_tracing;
use cadence_utils::ExitCode;
use clap::{CommandFactory, FromArgMatches};
use tracing::debug;

use super::args::Cli;
use super::commands::builtin_registry;

/// Main CLI execution function.
///
/// Returns `Ok(())` when the command succeeded, otherwise the exit code to
/// use. All output, including errors, has been printed by the time this
/// returns; `main` only maps the code to a process exit.
pub fn run() -> Result<(), ExitCode> {
    let registry = builtin_registry();
    let matches = Cli::command()
        .after_help(commands_help(&registry))
        .get_matches();
    let cli = Cli::from_arg_matches(&matches).map_err(|e| {
        let _ = e.print();
        ExitCode::CLI_ARGS
    })?;

    let config = match Config::discover(&cli.to_cli_args()) {
        Ok(config) => config,
        Err(err) => {
            let err = CadenceError::from(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }
    if let Some(path) = &config.config_path {
        debug!(path = %path.display(), "Loaded configuration");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    runtime.block_on(execute(registry, config, cli.command))
}

/// Run `args` through the orchestrator against the process-wide coordinator.
///
/// Interrupts that arrive while no command handler is registered end the
/// process immediately with the signal's conventional exit code.
pub async fn execute(
    registry: CommandRegistry,
    config: Config,
    args: Vec<String>,
) -> Result<(), ExitCode> {
    let coordinator = InterruptCoordinator::global();
    coordinator.set_fallback(|event| std::process::exit(event.exit_code().as_i32()));

    let orchestrator = CliOrchestrator::new(registry, coordinator)
        .with_config(config)
        .with_signal_source(Arc::new(ProcessSignalSource::new()));

    match orchestrator.run(args).await {
        Ok(output) => {
            if let Some(message) = &output.message {
                println!("{message}");
            }
            if output.exit_code.is_success() {
                Ok(())
            } else {
                Err(output.exit_code)
            }
        }
        Err(err) => {
            if !reported_by_orchestrator(&err) {
                eprintln!("{}", err.display_for_user());
            }
            Err(err.to_exit_code())
        }
    }
}

/// The orchestrator prints outcomes of the command itself; the caller
/// prints wiring and configuration failures.
fn reported_by_orchestrator(err: &CadenceError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::NotFound
            | ErrorKind::CommandError
            | ErrorKind::Interrupted
            | ErrorKind::InterruptTimeout
    )
}

fn commands_help(registry: &CommandRegistry) -> String {
    let mut help = String::from("COMMANDS:\n");
    for (name, description) in registry.describe() {
        help.push_str(&format!("  {name:<10} {description}\n"));
    }
    help
}
