//! Phase instrumentation for cadence runs
//!
//! Every run passes through `init`, `command` and `shutdown` exactly once,
//! in that order. [`Instrumentation`] enforces that discipline and produces
//! an [`InstrumentationReport`] once the last phase stops.

mod phase;
mod recorder;
mod report;
mod sink;

pub use phase::InstrumentationPhase;
pub use recorder::Instrumentation;
pub use report::{InstrumentationReport, PhaseEvent, PhaseEventKind, PhaseTiming};
pub use sink::{JsonFileSink, MemoryReportSink, ReportSink, TracingSink};

pub use cadence_utils::error::InstrumentationError;
