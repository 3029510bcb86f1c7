//! Destinations for finished instrumentation reports.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::phase::InstrumentationPhase;
use crate::report::InstrumentationReport;
use cadence_utils::atomic_write::write_atomic;
use cadence_utils::logging::log_phase_report;

/// Destination for finished reports.
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &InstrumentationReport) -> io::Result<()>;
}

/// Logs per-phase durations at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, report: &InstrumentationReport) -> io::Result<()> {
        let ms = |phase: InstrumentationPhase| {
            report
                .phase(phase)
                .map_or(0, |timing| timing.duration_ms.round() as u128)
        };
        log_phase_report(
            &report.command,
            ms(InstrumentationPhase::Init),
            ms(InstrumentationPhase::Command),
            ms(InstrumentationPhase::Shutdown),
        );
        Ok(())
    }
}

/// Writes `instrumentation.<command>.<timestamp>.json` into a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: Utf8PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// File name a report will be written under.
    #[must_use]
    pub fn file_name(report: &InstrumentationReport) -> String {
        let started = report
            .phases
            .first()
            .map(|timing| timing.started_at)
            .unwrap_or_else(chrono::Utc::now);
        let command: String = report
            .command
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!(
            "instrumentation.{command}.{}.json",
            started.format("%Y%m%dT%H%M%S%3fZ")
        )
    }
}

impl ReportSink for JsonFileSink {
    fn emit(&self, report: &InstrumentationReport) -> io::Result<()> {
        let path = self.dir.join(Self::file_name(report));
        let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
        write_atomic(path.as_std_path(), &json)?;
        info!(path = %path, "Wrote instrumentation report");
        Ok(())
    }
}

/// Keeps reports in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryReportSink {
    reports: Arc<Mutex<Vec<InstrumentationReport>>>,
}

impl MemoryReportSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reports(&self) -> Vec<InstrumentationReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<InstrumentationReport> {
        self.reports().pop()
    }
}

impl ReportSink for MemoryReportSink {
    fn emit(&self, report: &InstrumentationReport) -> io::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }
}
