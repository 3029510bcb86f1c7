//! cadence - command lifecycle runner with phase instrumentation
//!
//! cadence runs one user-invoked command through a fixed lifecycle
//! (`init` → `command` → `shutdown`), measures each phase, and coordinates
//! graceful interruption: when a signal or exit request arrives mid-run, the
//! command's `on_interrupt` cleanup finishes before the process exits.
//!
//! cadence can be used in two ways:
//! - **CLI**: `cadence [--verbose] [--grace-period SECS] <command> [args...]`
//! - **Library**: register your own [`Command`]s and drive them with a
//!   [`CliOrchestrator`]
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use cadence::{
//!     CliOrchestrator, Command, CommandContext, CommandOutput, CommandRegistry,
//!     InterruptCoordinator, ProcessSignalSource,
//! };
//!
//! struct Serve;
//!
//! #[async_trait]
//! impl Command for Serve {
//!     fn name(&self) -> &str {
//!         "serve"
//!     }
//!
//!     async fn run(&self, ctx: &CommandContext) -> anyhow::Result<CommandOutput> {
//!         ctx.wait_interrupted().await;
//!         Ok(CommandOutput::success())
//!     }
//!
//!     async fn on_interrupt(&self, ctx: &CommandContext) -> anyhow::Result<()> {
//!         ctx.ui.write_line("shutting down");
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> Result<(), cadence::CadenceError> {
//! let registry = CommandRegistry::new().with("serve", || Arc::new(Serve) as Arc<dyn Command>);
//! let orchestrator = CliOrchestrator::new(registry, InterruptCoordinator::global())
//!     .with_signal_source(Arc::new(ProcessSignalSource::new()));
//! orchestrator.run(vec!["serve".to_string()]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `cadence-interrupt` | Interrupt coordinator and signal sources |
//! | `cadence-orchestrator` | Run state machine, interrupt policy, terminators |
//! | `cadence-instrumentation` | Phase recorder and report sinks |
//! | `cadence-command` | `Command` trait, context, registry |
//! | `cadence-config` | `.cadence/config.toml` discovery and precedence |
//! | `cadence-tasks` | Package-manager subprocess task |
//! | `cadence-utils` | Errors, exit codes, logging, UI, text insertion |

pub mod cli;

pub use cadence_command::{Command, CommandContext, CommandOutput, CommandRegistry};
pub use cadence_config::{CliArgs, Config, ConfigBuilder, ConfigSource};
pub use cadence_instrumentation::{
    Instrumentation, InstrumentationPhase, InstrumentationReport, JsonFileSink,
    MemoryReportSink, ReportSink, TracingSink,
};
pub use cadence_interrupt::{
    CaptureGuard, InterruptCoordinator, InterruptEvent, MockSignalSource, ProcessSignalSource,
    SignalSource,
};
pub use cadence_orchestrator::{
    CliOrchestrator, InterruptPolicy, ProcessTerminator, RecordingTerminator, RunState,
    Terminator,
};
pub use cadence_tasks::{PackageManagerTask, TaskControl, TaskOptions, TaskOutcome};
pub use cadence_utils::error::{CadenceError, ErrorKind};
pub use cadence_utils::insertion::{
    Anchor, FileInsertOptions, FileInsertResult, InsertOptions, InsertResult, Marker,
    insert_into_file, insert_into_string,
};
pub use cadence_utils::ExitCode;
