//! Logging and observability infrastructure for cadence
//!
//! Structured logging through `tracing`. The binary installs the subscriber
//! once via [`init_tracing`]; library crates only emit events and spans.

use std::io::IsTerminal;
use tracing::{Level, debug, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Build the filter used by [`init_tracing`].
///
/// `RUST_LOG` always wins; otherwise verbose mode raises cadence crates to
/// `debug`.
#[must_use]
pub fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("cadence=debug,info")
            } else {
                EnvFilter::try_new("cadence=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing subscriber for structured logging
///
/// Sets up tracing with either compact (default) or verbose format. Logs go
/// to stderr so command output on stdout stays clean.
///
/// # Arguments
/// * `verbose` - If true, include targets and span close events with timings
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = default_filter(verbose);

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for one instrumentation phase of a command run
///
/// # Arguments
/// * `command` - The command name (or the raw first argument before resolution)
/// * `phase` - The phase name (`init`, `command`, `shutdown`)
pub fn phase_span(command: &str, phase: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "phase",
        command = %command,
        phase = %phase,
    )
}

/// Log phase start with structured fields
pub fn log_phase_start(command: &str, phase: &str) {
    debug!(command = %command, phase = %phase, "Phase started");
}

/// Log phase completion with duration
pub fn log_phase_complete(command: &str, phase: &str, duration_ms: u128) {
    debug!(
        command = %command,
        phase = %phase,
        duration_ms = %duration_ms,
        "Phase completed"
    );
}

/// Log a run state transition
pub fn log_transition(command: &str, from: &str, to: &str) {
    debug!(command = %command, from = %from, to = %to, "Run state transition");
}

/// Log the final per-phase durations of a run
pub fn log_phase_report(command: &str, init_ms: u128, command_ms: u128, shutdown_ms: u128) {
    info!(
        command = %command,
        init_ms = %init_ms,
        command_ms = %command_ms,
        shutdown_ms = %shutdown_ms,
        "Run timings"
    );
}
