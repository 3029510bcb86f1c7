//! Interrupt coordinator
//!
//! Owns at most one captured [`SignalSource`] and routes the first event of
//! each capture to the single registered handler.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::event::InterruptEvent;
use crate::source::SignalSource;
use cadence_utils::error::InterruptError;

/// The single active interrupt handler. Invoked at most once.
pub type InterruptHandler = Box<dyn FnOnce(InterruptEvent) -> BoxFuture<'static, ()> + Send>;

/// Receives events that arrive while no handler is registered.
pub type FallbackHandler = Arc<dyn Fn(InterruptEvent) + Send + Sync>;

/// What [`InterruptCoordinator::dispatch`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The registered handler was invoked.
    Handled,
    /// A handler was already dispatched during this capture.
    Ignored,
    /// No handler; the fallback ran.
    Fallback,
    /// No handler and no fallback; the event was dropped.
    Unhandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Idle,
    InFlight,
    Settled,
}

struct State {
    capturing: bool,
    generation: u64,
    source_name: &'static str,
    listener: Option<JoinHandle<()>>,
    handler: Option<InterruptHandler>,
    dispatch: DispatchState,
    fallback: Option<FallbackHandler>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            capturing: false,
            generation: 0,
            source_name: "none",
            listener: None,
            handler: None,
            dispatch: DispatchState::Idle,
            fallback: None,
        }
    }
}

static GLOBAL: Lazy<InterruptCoordinator> = Lazy::new(InterruptCoordinator::new);

/// Routes interrupt events from a captured [`SignalSource`] to one handler.
///
/// Cheap to clone; clones share state. The binary uses [`global`](Self::global);
/// tests build isolated instances with [`new`](Self::new).
///
/// Once an event has been dispatched to a handler, every further event is
/// ignored until [`release`](Self::release): the first dispatch is
/// authoritative.
#[derive(Clone, Default)]
pub struct InterruptCoordinator {
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for InterruptCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("InterruptCoordinator")
            .field("capturing", &state.capturing)
            .field("source", &state.source_name)
            .field("has_handler", &state.handler.is_some())
            .field("dispatch", &state.dispatch)
            .finish()
    }
}

impl InterruptCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide coordinator.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start owning `source`.
    ///
    /// Fails with [`InterruptError::AlreadyCapturing`] if a source is already
    /// captured. The returned guard releases the capture when dropped.
    pub fn capture(&self, source: Arc<dyn SignalSource>) -> Result<CaptureGuard, InterruptError> {
        let mut state = self.lock();
        if state.capturing {
            return Err(InterruptError::AlreadyCapturing);
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| InterruptError::SignalSetup {
                reason: format!("no tokio runtime: {e}"),
            })?;
        let mut events = source.subscribe()?;

        let weak: Weak<Mutex<State>> = Arc::downgrade(&self.state);
        let listener = runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(state) = weak.upgrade() else { break };
                InterruptCoordinator { state }.dispatch(event);
            }
        });

        state.capturing = true;
        state.generation += 1;
        state.source_name = source.name();
        state.listener = Some(listener);
        state.dispatch = DispatchState::Idle;
        debug!(source = source.name(), "Captured signal source");

        Ok(CaptureGuard {
            coordinator: self.clone(),
            generation: state.generation,
        })
    }

    /// Drop the subscription and the registered handler.
    ///
    /// Releasing when not capturing is a no-op.
    pub fn release(&self) {
        let mut state = self.lock();
        if !state.capturing {
            return;
        }
        if let Some(listener) = state.listener.take() {
            listener.abort();
        }
        state.capturing = false;
        state.handler = None;
        state.dispatch = DispatchState::Idle;
        debug!(source = state.source_name, "Released signal source");
        state.source_name = "none";
    }

    fn release_generation(&self, generation: u64) {
        if self.lock().generation == generation {
            self.release();
        }
    }

    /// Install the handler for the current run, replacing any previous one.
    pub fn set_handler<F, Fut>(&self, handler: F)
    where
        F: FnOnce(InterruptEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.set_boxed_handler(Box::new(move |event| handler(event).boxed()));
    }

    pub fn set_boxed_handler(&self, handler: InterruptHandler) {
        let mut state = self.lock();
        if state.handler.is_some() {
            debug!("Replacing registered interrupt handler");
        }
        state.handler = Some(handler);
    }

    /// Empty the handler slot.
    pub fn clear_handler(&self) {
        self.lock().handler = None;
    }

    /// Install the action taken for events that arrive with no handler registered.
    pub fn set_fallback<F>(&self, fallback: F)
    where
        F: Fn(InterruptEvent) + Send + Sync + 'static,
    {
        self.lock().fallback = Some(Arc::new(fallback));
    }

    pub fn clear_fallback(&self) {
        self.lock().fallback = None;
    }

    /// Route an exit request through the handler pipeline instead of exiting.
    pub fn request_exit(&self, code: i32) -> Result<DispatchOutcome, InterruptError> {
        if !self.is_capturing() {
            return Err(InterruptError::NotCapturing);
        }
        Ok(self.dispatch(InterruptEvent::ExitRequested { code }))
    }

    /// Deliver `event` to the registered handler.
    ///
    /// The handler's future is spawned on the current tokio runtime; the
    /// coordinator never terminates the process itself.
    pub fn dispatch(&self, event: InterruptEvent) -> DispatchOutcome {
        let mut state = self.lock();

        if state.dispatch != DispatchState::Idle {
            debug!(%event, "Interrupt already dispatched; ignoring");
            return DispatchOutcome::Ignored;
        }

        if let Some(handler) = state.handler.take() {
            let runtime = match tokio::runtime::Handle::try_current() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(%event, error = %e, "Cannot run interrupt handler outside a runtime");
                    state.handler = Some(handler);
                    return DispatchOutcome::Unhandled;
                }
            };
            state.dispatch = DispatchState::InFlight;
            drop(state);

            info!(%event, "Dispatching interrupt to handler");
            let future = handler(event);
            let weak = Arc::downgrade(&self.state);
            runtime.spawn(async move {
                future.await;
                if let Some(state) = weak.upgrade() {
                    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.dispatch == DispatchState::InFlight {
                        state.dispatch = DispatchState::Settled;
                    }
                }
            });
            return DispatchOutcome::Handled;
        }

        match state.fallback.clone() {
            Some(fallback) => {
                drop(state);
                debug!(%event, "No interrupt handler registered; using fallback");
                fallback(event);
                DispatchOutcome::Fallback
            }
            None => {
                debug!(%event, "No interrupt handler or fallback registered; ignoring");
                DispatchOutcome::Unhandled
            }
        }
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.lock().capturing
    }

    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.lock().handler.is_some()
    }

    /// True while a dispatched handler's future has not settled.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.lock().dispatch == DispatchState::InFlight
    }

    /// True once any event has been dispatched during the current capture.
    #[must_use]
    pub fn has_dispatched(&self) -> bool {
        self.lock().dispatch != DispatchState::Idle
    }
}

/// Scoped capture. Dropping it releases the coordinator.
///
/// A guard from an earlier capture never releases a later one.
#[must_use = "dropping the guard releases the capture immediately"]
pub struct CaptureGuard {
    coordinator: InterruptCoordinator,
    generation: u64,
}

impl CaptureGuard {
    #[must_use]
    pub fn coordinator(&self) -> &InterruptCoordinator {
        &self.coordinator
    }

    /// Release now instead of at drop.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.coordinator.release_generation(self.generation);
    }
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSignalSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn mock() -> Arc<MockSignalSource> {
        Arc::new(MockSignalSource::new())
    }

    #[tokio::test]
    async fn test_capture_twice_fails() {
        let coordinator = InterruptCoordinator::new();
        let _guard = coordinator.capture(mock()).unwrap();

        let err = coordinator.capture(mock()).unwrap_err();
        assert_eq!(err, InterruptError::AlreadyCapturing);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let coordinator = InterruptCoordinator::new();
        coordinator.release();

        let guard = coordinator.capture(mock()).unwrap();
        coordinator.release();
        coordinator.release();
        assert!(!coordinator.is_capturing());

        // Stale guard must not disturb a fresh capture.
        let _fresh = coordinator.capture(mock()).unwrap();
        drop(guard);
        assert!(coordinator.is_capturing());
    }

    #[tokio::test]
    async fn test_guard_drop_releases() {
        let coordinator = InterruptCoordinator::new();
        {
            let _guard = coordinator.capture(mock()).unwrap();
            assert!(coordinator.is_capturing());
        }
        assert!(!coordinator.is_capturing());
        assert!(coordinator.capture(mock()).is_ok());
    }

    #[test]
    fn test_capture_requires_runtime() {
        let coordinator = InterruptCoordinator::new();
        let err = coordinator.capture(mock()).unwrap_err();
        assert!(matches!(err, InterruptError::SignalSetup { .. }));
        assert!(!coordinator.is_capturing());
    }

    #[tokio::test]
    async fn test_event_invokes_handler_once() {
        let coordinator = InterruptCoordinator::new();
        let source = mock();
        let _guard = coordinator.capture(source.clone()).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = oneshot::channel();
        let counter = calls.clone();
        coordinator.set_handler(move |event| async move {
            assert_eq!(event, InterruptEvent::Interrupt);
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = done_tx.send(());
        });

        assert!(source.emit(InterruptEvent::Interrupt));
        assert!(source.emit(InterruptEvent::Interrupt));
        done_rx.await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(coordinator.has_dispatched());
        assert!(!coordinator.has_handler());
    }

    #[tokio::test]
    async fn test_second_dispatch_while_in_flight_is_ignored() {
        let coordinator = InterruptCoordinator::new();
        let _guard = coordinator.capture(mock()).unwrap();
        let (_hold_tx, hold_rx) = oneshot::channel::<()>();
        coordinator.set_handler(move |_| async move {
            let _ = hold_rx.await;
        });

        assert_eq!(
            coordinator.dispatch(InterruptEvent::Interrupt),
            DispatchOutcome::Handled
        );
        assert!(coordinator.is_dispatching());
        assert_eq!(
            coordinator.dispatch(InterruptEvent::Terminate),
            DispatchOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_cleared_handler_is_not_invoked() {
        let coordinator = InterruptCoordinator::new();
        let _guard = coordinator.capture(mock()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        coordinator.set_handler(move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        coordinator.clear_handler();

        assert_eq!(
            coordinator.dispatch(InterruptEvent::Interrupt),
            DispatchOutcome::Unhandled
        );
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_receives_unhandled_events() {
        let coordinator = InterruptCoordinator::new();
        let _guard = coordinator.capture(mock()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        coordinator.set_fallback(move |event| sink.lock().unwrap().push(event));

        assert_eq!(
            coordinator.dispatch(InterruptEvent::Terminate),
            DispatchOutcome::Fallback
        );
        assert_eq!(*seen.lock().unwrap(), vec![InterruptEvent::Terminate]);
    }

    #[tokio::test]
    async fn test_request_exit_routes_through_handler() {
        let coordinator = InterruptCoordinator::new();
        assert_eq!(
            coordinator.request_exit(1).unwrap_err(),
            InterruptError::NotCapturing
        );

        let _guard = coordinator.capture(mock()).unwrap();
        let (tx, rx) = oneshot::channel();
        coordinator.set_handler(move |event| async move {
            let _ = tx.send(event);
        });

        assert_eq!(coordinator.request_exit(4).unwrap(), DispatchOutcome::Handled);
        assert_eq!(rx.await.unwrap(), InterruptEvent::ExitRequested { code: 4 });
    }

    #[tokio::test]
    async fn test_release_clears_handler_and_unsubscribes() {
        let coordinator = InterruptCoordinator::new();
        let source = mock();
        let guard = coordinator.capture(source.clone()).unwrap();
        coordinator.set_handler(|_| async {});

        guard.release();
        // Let the runtime drop the aborted listener task.
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!coordinator.has_handler());
        assert!(!source.is_subscribed());
    }

    #[tokio::test]
    async fn test_global_is_shared() {
        let a = InterruptCoordinator::global();
        let b = InterruptCoordinator::global();
        assert!(Arc::ptr_eq(&a.state, &b.state));
    }
}
