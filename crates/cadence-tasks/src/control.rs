//! Cooperative cancellation shared between a task and whoever stops it.

use std::sync::Arc;

use tokio::sync::watch;

/// Lifecycle of the subprocess behind a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Nothing has been spawned yet.
    Idle,
    Running,
    /// The child exited, was killed, or never started because of an error.
    Finished,
}

/// Cancellation and progress handle shared between a task and its owner.
///
/// Clones share state. A command keeps one clone so its `on_interrupt`
/// hook can cancel the subprocess and wait for it to go away.
#[derive(Debug, Clone)]
pub struct TaskControl {
    cancel: Arc<watch::Sender<bool>>,
    state: Arc<watch::Sender<TaskState>>,
}

impl Default for TaskControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskControl {
    #[must_use]
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        let (state, _) = watch::channel(TaskState::Idle);
        Self {
            cancel: Arc::new(cancel),
            state: Arc::new(state),
        }
    }

    /// Ask the task to stop. Sticky: a task started afterwards is refused.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolve once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    #[must_use]
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Resolve once no subprocess is running.
    pub async fn wait_settled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state != TaskState::Running).await;
    }

    pub(crate) fn running(&self) -> RunningGuard {
        self.state.send_replace(TaskState::Running);
        RunningGuard {
            state: Arc::clone(&self.state),
        }
    }
}

/// Marks the task finished when dropped, including when the owning future
/// is dropped mid-run.
pub(crate) struct RunningGuard {
    state: Arc<watch::Sender<TaskState>>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.state.send_replace(TaskState::Finished);
    }
}
