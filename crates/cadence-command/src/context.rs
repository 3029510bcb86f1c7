//! Per-run context handed to every command hook.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cadence_config::Config;
use cadence_utils::ui::{ConsoleUi, SharedUi};
use tokio::sync::watch;

/// Everything a command can see during one run.
///
/// Cheap to clone; clones share the interrupt flag.
#[derive(Clone)]
pub struct CommandContext {
    /// Positional arguments after the command name.
    pub args: Vec<String>,
    pub config: Arc<Config>,
    pub ui: SharedUi,
    /// Directory the command operates on.
    pub project_root: PathBuf,
    interrupted: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("args", &self.args)
            .field("project_root", &self.project_root)
            .field("interrupted", &self.interrupted())
            .finish_non_exhaustive()
    }
}

impl CommandContext {
    /// Context rooted at the current directory, printing to the console.
    pub fn new(args: Vec<String>, config: impl Into<Arc<Config>>) -> Self {
        let (interrupted, _) = watch::channel(false);
        Self {
            args,
            config: config.into(),
            ui: Arc::new(ConsoleUi),
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            interrupted: Arc::new(interrupted),
        }
    }

    #[must_use]
    pub fn with_ui(mut self, ui: SharedUi) -> Self {
        self.ui = ui;
        self
    }

    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// True once an external interrupt has been delivered for this run.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        *self.interrupted.borrow()
    }

    /// Flag the run as interrupted. Set by the orchestrator before it
    /// invokes `on_interrupt`.
    pub fn mark_interrupted(&self) {
        self.interrupted.send_replace(true);
    }

    /// Resolve once the run has been interrupted.
    pub async fn wait_interrupted(&self) {
        let mut rx = self.interrupted.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|interrupted| *interrupted).await;
    }
}
