//! In-memory signal source for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::event::{InterruptEvent, control_bytes};
use crate::source::SignalSource;
use cadence_utils::error::InterruptError;

/// Scriptable [`SignalSource`] for tests.
///
/// Events emitted before anyone subscribes are dropped, just like a signal
/// that arrives with no handler installed.
#[derive(Debug, Default)]
pub struct MockSignalSource {
    sender: Mutex<Option<mpsc::UnboundedSender<InterruptEvent>>>,
    subscriptions: AtomicUsize,
}

impl MockSignalSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to the current subscriber. Returns false if nobody listens.
    pub fn emit(&self, event: InterruptEvent) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        sender
            .as_ref()
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Feed raw terminal input; each `0x03` becomes a [`InterruptEvent::ControlByte`].
    pub fn emit_stdin(&self, bytes: &[u8]) -> usize {
        let mut delivered = 0;
        for _ in 0..control_bytes(bytes) {
            if self.emit(InterruptEvent::ControlByte) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Simulate code calling the host exit primitive.
    pub fn request_exit(&self, code: i32) -> bool {
        self.emit(InterruptEvent::ExitRequested { code })
    }

    /// True while a subscriber holds the receiving end.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        sender.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// How many times [`SignalSource::subscribe`] has been called.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

impl SignalSource for MockSignalSource {
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<InterruptEvent>, InterruptError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
