//! Command lifecycle driver
//!
//! Resolves the command, runs its hooks, races completion against
//! interrupts, and always finishes with the shutdown phase.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use camino::Utf8PathBuf;
use cadence_command::{Command, CommandContext, CommandOutput, CommandRegistry};
use cadence_config::Config;
use cadence_instrumentation::{
    Instrumentation, InstrumentationPhase, JsonFileSink, ReportSink, TracingSink,
};
use cadence_interrupt::{InterruptCoordinator, InterruptEvent, SignalSource};
use cadence_utils::error::{CadenceError, HookStage};
use cadence_utils::logging::{log_transition, phase_span};
use cadence_utils::ui::{ConsoleUi, SharedUi};
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{Instrument, debug, info, warn};

use crate::policy::InterruptPolicy;
use crate::state::RunState;
use crate::terminator::{ProcessTerminator, Terminator};

// Who settled the current run first: the command or an interrupt.
const RUNNING: u8 = 0;
const SETTLED: u8 = 1;
const INTERRUPTED: u8 = 2;

/// `None` means an interrupt landed during `before_run` and `run` was skipped.
type WorkResult = Result<Option<CommandOutput>, CadenceError>;
type CleanupResult = Result<anyhow::Result<()>, oneshot::error::RecvError>;

enum Race {
    Interrupt(InterruptEvent),
    Settled(WorkResult),
}

enum Flow {
    Completed(WorkResult),
    Interrupted {
        event: InterruptEvent,
        run_settled: bool,
    },
}

/// Drives a single command invocation from argument vector to exit.
///
/// The orchestrator owns no process-wide state of its own. Interrupts reach
/// it through the [`InterruptCoordinator`] it was built with, and process
/// termination goes through a [`Terminator`] so tests can observe it.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use cadence_command::CommandRegistry;
/// use cadence_interrupt::{InterruptCoordinator, ProcessSignalSource};
/// use cadence_orchestrator::CliOrchestrator;
///
/// # async fn demo(registry: CommandRegistry) {
/// let orchestrator = CliOrchestrator::new(registry, InterruptCoordinator::global())
///     .with_signal_source(Arc::new(ProcessSignalSource::new()));
/// let outcome = orchestrator.run(vec!["clean".to_string()]).await;
/// # let _ = outcome;
/// # }
/// ```
pub struct CliOrchestrator {
    registry: CommandRegistry,
    coordinator: InterruptCoordinator,
    config: Arc<Config>,
    ui: SharedUi,
    project_root: PathBuf,
    terminator: Arc<dyn Terminator>,
    sinks: Vec<Arc<dyn ReportSink>>,
    policy: InterruptPolicy,
    signal_source: Option<Arc<dyn SignalSource>>,
    history: Mutex<Vec<RunState>>,
}

impl std::fmt::Debug for CliOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliOrchestrator")
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .field("project_root", &self.project_root)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CliOrchestrator {
    pub fn new(registry: CommandRegistry, coordinator: InterruptCoordinator) -> Self {
        Self {
            registry,
            coordinator,
            config: Arc::new(Config::default()),
            ui: Arc::new(ConsoleUi),
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            terminator: Arc::new(ProcessTerminator),
            sinks: vec![Arc::new(TracingSink)],
            policy: InterruptPolicy::default(),
            signal_source: None,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Use `config` for command contexts. Also adopts its grace period;
    /// call [`with_interrupt_policy`](Self::with_interrupt_policy) afterwards
    /// to override that.
    #[must_use]
    pub fn with_config(mut self, config: impl Into<Arc<Config>>) -> Self {
        let config = config.into();
        self.policy = InterruptPolicy::from_config(&config);
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Add a destination for the per-run instrumentation report.
    #[must_use]
    pub fn with_report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub fn with_ui(mut self, ui: SharedUi) -> Self {
        self.ui = ui;
        self
    }

    #[must_use]
    pub fn with_interrupt_policy(mut self, policy: InterruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Capture `source` on the coordinator for the duration of each run.
    ///
    /// Without a source the orchestrator assumes the caller captured the
    /// coordinator itself. Shutdown releases it either way.
    #[must_use]
    pub fn with_signal_source(mut self, source: Arc<dyn SignalSource>) -> Self {
        self.signal_source = Some(source);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    #[must_use]
    pub fn coordinator(&self) -> &InterruptCoordinator {
        &self.coordinator
    }

    /// Most recent state of the last (or current) run.
    #[must_use]
    pub fn state(&self) -> Option<RunState> {
        self.history_lock().last().copied()
    }

    /// Every state the last run passed through, in order.
    #[must_use]
    pub fn state_history(&self) -> Vec<RunState> {
        self.history_lock().clone()
    }

    /// Run the command named by `args[0]` with the remaining arguments.
    ///
    /// Returns the command's output on success. Every other outcome is a
    /// [`CadenceError`]: an unknown name, a failed hook (the original error
    /// is preserved), or an interruption. Interrupted runs call the
    /// [`Terminator`] after shutdown completes and before returning.
    pub async fn run(&self, args: Vec<String>) -> Result<CommandOutput, CadenceError> {
        self.history_lock().clear();

        let mut args = args.into_iter();
        let requested = args.next().unwrap_or_default();
        let rest: Vec<String> = args.collect();

        let mut instrumentation = Instrumentation::new(requested.clone());
        self.transition(&requested, RunState::Init);
        instrumentation.start(InstrumentationPhase::Init)?;

        let _capture = self
            .signal_source
            .as_ref()
            .map(|source| self.coordinator.capture(Arc::clone(source)))
            .transpose()?;

        self.transition(&requested, RunState::ResolvingCommand);
        let Some(command) = self.registry.resolve(&requested) else {
            return self.not_found(&requested, instrumentation);
        };
        info!(command = %requested, args = ?rest, "Running command");

        instrumentation.stop(InstrumentationPhase::Init)?;
        instrumentation.start(InstrumentationPhase::Command)?;

        let ctx = CommandContext::new(rest, Arc::clone(&self.config))
            .with_ui(Arc::clone(&self.ui))
            .with_project_root(self.project_root.clone());
        let run_state = Arc::new(AtomicU8::new(RUNNING));
        let (interrupt_tx, mut interrupt_rx) = oneshot::channel();
        let (cleanup_tx, cleanup_rx) = oneshot::channel();
        self.install_interrupt_handler(&command, &ctx, &run_state, interrupt_tx, cleanup_tx);

        let work = self
            .work(&requested, command.as_ref(), &ctx, &run_state)
            .instrument(phase_span(&requested, InstrumentationPhase::Command.as_str()));
        tokio::pin!(work);

        let race = tokio::select! {
            biased;
            Ok(event) = &mut interrupt_rx => Race::Interrupt(event),
            result = &mut work => Race::Settled(result),
        };

        let flow = match race {
            Race::Interrupt(event) => Flow::Interrupted {
                event,
                run_settled: false,
            },
            Race::Settled(result) => {
                if run_state
                    .compare_exchange(RUNNING, SETTLED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    Flow::Completed(result)
                } else {
                    // An interrupt claimed the run first; its event is already queued.
                    match (&mut interrupt_rx).await {
                        Ok(event) => Flow::Interrupted {
                            event,
                            run_settled: true,
                        },
                        Err(_) => Flow::Completed(result),
                    }
                }
            }
        };

        match flow {
            Flow::Completed(result) => {
                self.coordinator.clear_handler();
                self.complete(&requested, instrumentation, result)
            }
            Flow::Interrupted { event, run_settled } => {
                self.transition(&requested, RunState::Interrupting);
                warn!(
                    command = %requested,
                    signal = event.signal_name(),
                    "Interrupt received; waiting for cleanup"
                );
                let cleanup = self
                    .await_cleanup(cleanup_rx, work.as_mut(), run_settled)
                    .await;
                self.interrupted(&requested, instrumentation, event, cleanup)
            }
        }
    }

    fn complete(
        &self,
        command: &str,
        mut instrumentation: Instrumentation,
        result: WorkResult,
    ) -> Result<CommandOutput, CadenceError> {
        instrumentation.stop(InstrumentationPhase::Command)?;
        match result {
            Ok(output) => {
                self.transition(command, RunState::Completing);
                self.shutdown(command, instrumentation, "success")?;
                self.transition(command, RunState::Done);
                Ok(output.unwrap_or_default())
            }
            Err(err) => {
                warn!(command = %command, error = %err, "Command failed");
                self.ui.write_error_line(err.display_for_user().trim_end());
                self.shutdown(command, instrumentation, err.kind().as_str())?;
                self.transition(command, RunState::Crashed);
                Err(err)
            }
        }
    }

    fn interrupted(
        &self,
        command: &str,
        mut instrumentation: Instrumentation,
        event: InterruptEvent,
        cleanup: Option<CleanupResult>,
    ) -> Result<CommandOutput, CadenceError> {
        let err = match cleanup {
            Some(result) => {
                match result {
                    Ok(Ok(())) => debug!(command = %command, "Interrupt cleanup finished"),
                    Ok(Err(error)) => {
                        warn!(command = %command, error = %format!("{error:#}"), "on_interrupt failed");
                    }
                    Err(_) => warn!(command = %command, "Interrupt cleanup ended without a result"),
                }
                CadenceError::Interrupted {
                    command: command.to_string(),
                    signal: event.signal_name().to_string(),
                    exit_code: event.exit_code().as_i32(),
                }
            }
            None => {
                let grace = self.policy.grace_period.unwrap_or_default();
                warn!(
                    command = %command,
                    grace_ms = grace.as_millis(),
                    "Interrupt cleanup exceeded the grace period"
                );
                let err = CadenceError::InterruptTimeout {
                    command: command.to_string(),
                    grace,
                };
                self.ui.write_error_line(err.display_for_user().trim_end());
                err
            }
        };

        self.coordinator.clear_handler();
        instrumentation.stop(InstrumentationPhase::Command)?;
        self.shutdown(command, instrumentation, err.kind().as_str())?;
        self.transition(command, RunState::Done);
        self.terminator.terminate(err.to_exit_code());
        Err(err)
    }

    fn not_found(
        &self,
        requested: &str,
        mut instrumentation: Instrumentation,
    ) -> Result<CommandOutput, CadenceError> {
        let err = CadenceError::CommandNotFound {
            name: requested.to_string(),
            available: self.registry.names(),
        };
        warn!(command = %requested, "Command not found");

        instrumentation.stop(InstrumentationPhase::Init)?;
        instrumentation.start(InstrumentationPhase::Command)?;
        instrumentation.stop(InstrumentationPhase::Command)?;
        self.ui.write_error_line(err.display_for_user().trim_end());
        self.shutdown(requested, instrumentation, err.kind().as_str())?;
        self.transition(requested, RunState::Done);
        Err(err)
    }

    /// Registers the per-run handler. Whichever of the handler and the
    /// completing command flips `run_state` first decides the outcome.
    fn install_interrupt_handler(
        &self,
        command: &Arc<dyn Command>,
        ctx: &CommandContext,
        run_state: &Arc<AtomicU8>,
        interrupt_tx: oneshot::Sender<InterruptEvent>,
        cleanup_tx: oneshot::Sender<anyhow::Result<()>>,
    ) {
        let command = Arc::clone(command);
        let ctx = ctx.clone();
        let run_state = Arc::clone(run_state);

        self.coordinator.set_handler(move |event| {
            let claimed = run_state
                .compare_exchange(RUNNING, INTERRUPTED, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok();
            if claimed {
                ctx.mark_interrupted();
                let _ = interrupt_tx.send(event);
            } else {
                debug!(%event, "Interrupt arrived after the command settled; ignoring");
            }

            async move {
                if claimed {
                    let result = command.on_interrupt(&ctx).await;
                    let _ = cleanup_tx.send(result);
                }
            }
        });
    }

    async fn work(
        &self,
        name: &str,
        command: &dyn Command,
        ctx: &CommandContext,
        run_state: &AtomicU8,
    ) -> WorkResult {
        self.transition(name, RunState::BeforeRun);
        guarded(name, HookStage::BeforeRun, command.before_run(ctx)).await?;

        if run_state.load(Ordering::SeqCst) == INTERRUPTED {
            debug!(command = %name, "Interrupted during before_run; skipping run");
            return Ok(None);
        }

        self.transition(name, RunState::Running);
        guarded(name, HookStage::Run, command.run(ctx)).await.map(Some)
    }

    /// Wait for `on_interrupt` to settle, bounded by the grace period.
    ///
    /// `run` keeps being polled meanwhile so commands that watch
    /// [`CommandContext::wait_interrupted`] can wind down. A `run` still
    /// pending once cleanup settles is dropped by the caller.
    async fn await_cleanup<F>(
        &self,
        mut cleanup_rx: oneshot::Receiver<anyhow::Result<()>>,
        mut work: Pin<&mut F>,
        run_settled: bool,
    ) -> Option<CleanupResult>
    where
        F: Future<Output = WorkResult>,
    {
        let mut run_pending = !run_settled;
        let wait = async {
            loop {
                tokio::select! {
                    biased;
                    result = &mut cleanup_rx => return result,
                    result = work.as_mut(), if run_pending => {
                        run_pending = false;
                        if let Err(err) = result {
                            debug!(error = %err, "Command failed after interrupt; superseded");
                        }
                    }
                }
            }
        };

        match self.policy.grace_period {
            Some(grace) => tokio::time::timeout(grace, wait).await.ok(),
            None => Some(wait.await),
        }
    }

    fn shutdown(
        &self,
        command: &str,
        mut instrumentation: Instrumentation,
        outcome: &str,
    ) -> Result<(), CadenceError> {
        self.transition(command, RunState::Shutdown);
        let _span = phase_span(command, InstrumentationPhase::Shutdown.as_str()).entered();

        instrumentation.start(InstrumentationPhase::Shutdown)?;
        self.coordinator.release();
        instrumentation.stop(InstrumentationPhase::Shutdown)?;
        instrumentation.set_outcome(outcome);

        let report = instrumentation.finish()?;
        for sink in self.report_sinks() {
            if let Err(e) = sink.emit(&report) {
                warn!(command = %command, error = %e, "Failed to emit instrumentation report");
            }
        }
        Ok(())
    }

    fn report_sinks(&self) -> Vec<Arc<dyn ReportSink>> {
        let mut sinks = self.sinks.clone();
        if self.config.instrumentation_enabled() {
            let dir = self.config.instrumentation_dir();
            let dir = if dir.is_absolute() {
                dir
            } else {
                Utf8PathBuf::from_path_buf(self.project_root.join(dir.as_std_path()))
                    .unwrap_or(dir)
            };
            sinks.push(Arc::new(JsonFileSink::new(dir)));
        }
        sinks
    }

    fn transition(&self, command: &str, to: RunState) {
        let mut history = self.history_lock();
        let from = history.last().map_or("start", RunState::as_str);
        log_transition(command, from, to.as_str());
        history.push(to);
    }

    fn history_lock(&self) -> std::sync::MutexGuard<'_, Vec<RunState>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn hook_failure(command: &str, stage: HookStage, error: anyhow::Error) -> CadenceError {
    CadenceError::HookFailure {
        command: command.to_string(),
        stage,
        error,
    }
}

/// Await a command hook, turning both errors and panics into `HookFailure`.
async fn guarded<T, F>(command: &str, stage: HookStage, hook: F) -> Result<T, CadenceError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(result) => result.map_err(|error| hook_failure(command, stage, error)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(command = %command, %stage, panic = %message, "Command hook panicked");
            Err(hook_failure(
                command,
                stage,
                anyhow::anyhow!("{stage} hook panicked: {message}"),
            ))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
