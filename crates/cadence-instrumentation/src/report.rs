//! Serializable instrumentation report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::InstrumentationPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseEventKind {
    Start,
    Stop,
}

/// One entry in the append-only phase log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEvent {
    pub phase: InstrumentationPhase,
    pub kind: PhaseEventKind,
    pub at: DateTime<Utc>,
}

/// Start/stop pair for one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: InstrumentationPhase,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    /// Measured on the monotonic clock.
    pub duration_ms: f64,
}

/// Emitted once per run, after `shutdown` stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationReport {
    /// Resolved command name, or the raw first argument when resolution failed.
    pub command: String,
    /// Run outcome (`success`, `commandError`, `interrupted`, ...), if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// One entry per phase, in run order.
    pub phases: Vec<PhaseTiming>,
    pub events: Vec<PhaseEvent>,
    pub total_duration_ms: f64,
}

impl InstrumentationReport {
    #[must_use]
    pub fn phase(&self, phase: InstrumentationPhase) -> Option<&PhaseTiming> {
        self.phases.iter().find(|timing| timing.phase == phase)
    }

    /// Phases in the order their start events were logged.
    #[must_use]
    pub fn start_order(&self) -> Vec<InstrumentationPhase> {
        self.events
            .iter()
            .filter(|event| event.kind == PhaseEventKind::Start)
            .map(|event| event.phase)
            .collect()
    }
}
