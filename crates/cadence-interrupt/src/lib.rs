//! Interrupt coordination for cadence
//!
//! A [`SignalSource`] turns host signals (Ctrl-C, SIGTERM, a raw `0x03` on
//! stdin, explicit exit requests) into [`InterruptEvent`]s. The
//! [`InterruptCoordinator`] owns one captured source at a time and routes
//! each event to the single registered handler.

mod coordinator;
mod event;
mod mock;
mod source;

pub use coordinator::{
    CaptureGuard, DispatchOutcome, FallbackHandler, InterruptCoordinator, InterruptHandler,
};
pub use event::{CONTROL_BYTE, InterruptEvent, control_bytes};
pub use mock::MockSignalSource;
pub use source::{ProcessSignalSource, SignalSource};

pub use cadence_utils::error::InterruptError;
