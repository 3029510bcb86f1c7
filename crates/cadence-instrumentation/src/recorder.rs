//! Phase recorder
//!
//! Enforces the init, command, shutdown ordering and produces the report
//! once the last phase stops.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::phase::InstrumentationPhase;
use crate::report::{InstrumentationReport, PhaseEvent, PhaseEventKind, PhaseTiming};
use cadence_utils::error::InstrumentationError;
use cadence_utils::logging::{log_phase_complete, log_phase_start};

#[derive(Debug, Clone, Copy)]
struct Mark {
    instant: Instant,
    wall: DateTime<Utc>,
}

impl Mark {
    fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    started: Option<Mark>,
    stopped: Option<Mark>,
}

/// Records start/stop marks for the three run phases.
///
/// Owned by a single run; never shared. Any deviation from
/// `start(init) stop(init) start(command) ... stop(shutdown)` is an
/// [`InstrumentationError`].
#[derive(Debug)]
pub struct Instrumentation {
    command: String,
    outcome: Option<String>,
    slots: [Slot; 3],
    events: Vec<PhaseEvent>,
}

impl Instrumentation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            outcome: None,
            slots: [Slot::default(); 3],
            events: Vec::with_capacity(6),
        }
    }

    /// Rename the run once the command has been resolved.
    pub fn set_command(&mut self, command: impl Into<String>) {
        self.command = command.into();
    }

    pub fn set_outcome(&mut self, outcome: impl Into<String>) {
        self.outcome = Some(outcome.into());
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn start(&mut self, phase: InstrumentationPhase) -> Result<(), InstrumentationError> {
        if self.slots[phase.index()].started.is_some() {
            return Err(InstrumentationError::AlreadyStarted {
                phase: phase.to_string(),
            });
        }
        if let Some(previous) = phase.previous()
            && self.slots[previous.index()].stopped.is_none()
        {
            return Err(InstrumentationError::OutOfOrder {
                phase: phase.to_string(),
                previous: previous.to_string(),
            });
        }

        let mark = Mark::now();
        self.slots[phase.index()].started = Some(mark);
        self.events.push(PhaseEvent {
            phase,
            kind: PhaseEventKind::Start,
            at: mark.wall,
        });
        log_phase_start(&self.command, phase.as_str());
        Ok(())
    }

    /// Stop `phase` and return how long it ran.
    pub fn stop(&mut self, phase: InstrumentationPhase) -> Result<Duration, InstrumentationError> {
        let slot = &mut self.slots[phase.index()];
        let Some(started) = slot.started else {
            return Err(InstrumentationError::NotStarted {
                phase: phase.to_string(),
            });
        };
        if slot.stopped.is_some() {
            return Err(InstrumentationError::AlreadyStopped {
                phase: phase.to_string(),
            });
        }

        let mark = Mark::now();
        slot.stopped = Some(mark);
        self.events.push(PhaseEvent {
            phase,
            kind: PhaseEventKind::Stop,
            at: mark.wall,
        });

        let elapsed = mark.instant.duration_since(started.instant);
        log_phase_complete(&self.command, phase.as_str(), elapsed.as_millis());
        Ok(elapsed)
    }

    #[must_use]
    pub fn is_running(&self, phase: InstrumentationPhase) -> bool {
        let slot = self.slots[phase.index()];
        slot.started.is_some() && slot.stopped.is_none()
    }

    /// Build the report. Every phase must have stopped.
    pub fn finish(self) -> Result<InstrumentationReport, InstrumentationError> {
        let mut phases = Vec::with_capacity(3);
        for phase in InstrumentationPhase::ALL {
            let slot = self.slots[phase.index()];
            let (Some(started), Some(stopped)) = (slot.started, slot.stopped) else {
                return Err(InstrumentationError::Incomplete {
                    phase: phase.to_string(),
                });
            };
            phases.push(PhaseTiming {
                phase,
                started_at: started.wall,
                stopped_at: stopped.wall,
                duration_ms: millis(stopped.instant.duration_since(started.instant)),
            });
        }

        let total = match (self.slots[0].started, self.slots[2].stopped) {
            (Some(first), Some(last)) => last.instant.duration_since(first.instant),
            _ => Duration::ZERO,
        };

        Ok(InstrumentationReport {
            command: self.command,
            outcome: self.outcome,
            phases,
            events: self.events,
            total_duration_ms: millis(total),
        })
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
