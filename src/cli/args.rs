//! CLI argument definitions
//!
//! Global flags come before the command name; everything from the command
//! name onwards is handed to the command untouched.

use std::path::PathBuf;

use cadence_config::CliArgs;
use clap::Parser;

/// cadence - run a command through init, command and shutdown phases
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Run project commands with phase instrumentation and graceful interrupts")]
#[command(long_about = r#"
cadence runs a single command through a fixed lifecycle (init, command,
shutdown), times each phase, and lets an interrupted command finish its
cleanup before the process exits.

EXAMPLES:
  # Remove build output and dependencies
  cadence clean --skip-bower

  # Install dependencies with the configured package manager
  cadence install --verbose

  # Bound interrupt cleanup to five seconds
  cadence --grace-period 5 install

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .cadence/config.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Seconds an interrupted command may spend cleaning up (default: wait)
    #[arg(long, value_name = "SECS")]
    pub grace_period: Option<f64>,

    /// Write a JSON instrumentation report for this run
    #[arg(long)]
    pub instrumentation: bool,

    /// Package manager used by `install` (default: npm)
    #[arg(long, value_name = "PROGRAM")]
    pub package_manager: Option<String>,

    /// Command name followed by its arguments
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 1..,
        required = true
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// Overrides for configuration discovery. Absent flags stay `None`.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            verbose: self.verbose.then_some(true),
            grace_period_secs: self.grace_period,
            instrumentation: self.instrumentation.then_some(true),
            package_manager: self.package_manager.clone(),
            output_path: None,
        }
    }
}
