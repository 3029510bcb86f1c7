//! Package manager subprocess task
//!
//! Spawns `<manager> <subcommand> [args...]`, relays its output line by line
//! and maps spawn failures and exit statuses onto [`TaskError`].

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use cadence_utils::error::TaskError;
use cadence_utils::ui::SharedUi;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::control::TaskControl;
use crate::platform;
use crate::spec::TaskSpec;

/// How long a cancelled child gets between SIGTERM and SIGKILL.
pub const DEFAULT_KILL_AFTER: Duration = Duration::from_secs(5);

/// Which pipe a relayed line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// One line of subprocess output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub stream: Stream,
    pub message: String,
}

/// Per-invocation switches.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Print each relayed line through the UI, not just the log.
    pub verbose: bool,
    /// Describe the invocation without spawning anything.
    pub dry_run: bool,
    /// Extra arguments after the subcommand.
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    DryRun { spec: TaskSpec },
    Completed { log: Vec<LogLine> },
}

impl TaskOutcome {
    #[must_use]
    pub fn log(&self) -> &[LogLine] {
        match self {
            Self::DryRun { .. } => &[],
            Self::Completed { log } => log,
        }
    }
}

enum Exit {
    Cancelled,
    Exited(io::Result<ExitStatus>),
}

/// Runs `<manager> <subcommand> [args...]` and relays its output.
pub struct PackageManagerTask {
    manager: String,
    subcommand: String,
    start_progress_message: Option<String>,
    completion_message: Option<String>,
    ui: SharedUi,
    cwd: Option<PathBuf>,
    kill_after: Duration,
    control: TaskControl,
}

impl std::fmt::Debug for PackageManagerTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageManagerTask")
            .field("manager", &self.manager)
            .field("subcommand", &self.subcommand)
            .field("cwd", &self.cwd)
            .field("state", &self.control.state())
            .finish_non_exhaustive()
    }
}

impl PackageManagerTask {
    pub fn new(manager: impl Into<String>, subcommand: impl Into<String>, ui: SharedUi) -> Self {
        Self {
            manager: manager.into(),
            subcommand: subcommand.into(),
            start_progress_message: None,
            completion_message: None,
            ui,
            cwd: None,
            kill_after: DEFAULT_KILL_AFTER,
            control: TaskControl::new(),
        }
    }

    /// Printed before the child is spawned.
    #[must_use]
    pub fn start_progress_message(mut self, message: impl Into<String>) -> Self {
        self.start_progress_message = Some(message.into());
        self
    }

    /// Printed after the child exits successfully.
    #[must_use]
    pub fn completion_message(mut self, message: impl Into<String>) -> Self {
        self.completion_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn kill_after(mut self, kill_after: Duration) -> Self {
        self.kill_after = kill_after;
        self
    }

    /// Share an existing control handle instead of the task's own.
    #[must_use]
    pub fn with_control(mut self, control: TaskControl) -> Self {
        self.control = control;
        self
    }

    #[must_use]
    pub fn control(&self) -> &TaskControl {
        &self.control
    }

    /// The invocation `run` would spawn.
    #[must_use]
    pub fn spec(&self, options: &TaskOptions) -> TaskSpec {
        let spec = TaskSpec::new(&self.manager)
            .arg(&self.subcommand)
            .args(&options.args);
        match &self.cwd {
            Some(cwd) => spec.cwd(cwd),
            None => spec,
        }
    }

    /// Spawn the child, relay its output, and wait for it to exit.
    ///
    /// Fails with [`TaskError::CommandNotFound`] when the manager binary is
    /// missing, [`TaskError::ExitStatus`] on a non-zero exit, and
    /// [`TaskError::Cancelled`] once the control handle is cancelled (the
    /// child is terminated before this returns).
    pub async fn run(&self, options: &TaskOptions) -> Result<TaskOutcome, TaskError> {
        let spec = self.spec(options);
        let label = self.label();

        if options.dry_run {
            info!(task = %label, command = %spec, "Dry run; not spawning");
            if options.verbose {
                self.ui.write_line(&format!("Would run: {spec}"));
            }
            return Ok(TaskOutcome::DryRun { spec });
        }
        if self.control.is_cancelled() {
            return Err(self.cancelled_error());
        }

        if let Some(message) = &self.start_progress_message {
            self.ui.write_line(message);
        }
        debug!(task = %label, command = %spec, "Spawning task");

        let mut child = match spec.to_tokio_command().spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let err = TaskError::CommandNotFound {
                    program: self.manager.clone(),
                    subcommand: self.subcommand.clone(),
                };
                self.ui.write_error_line(&err.to_string());
                return Err(err);
            }
            Err(e) => {
                return Err(TaskError::SpawnFailed {
                    reason: format!("{label}: {e}"),
                });
            }
        };
        let _running = self.control.running();

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(TaskError::SpawnFailed {
                reason: format!("{label}: output pipes unavailable"),
            });
        };
        let mut stdout = BufReader::new(stdout).lines();
        let mut stderr = BufReader::new(stderr).lines();
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut log = Vec::new();
        let mut cancelled = false;

        while stdout_open || stderr_open {
            tokio::select! {
                biased;
                () = self.control.cancelled() => {
                    cancelled = true;
                    break;
                }
                line = stdout.next_line(), if stdout_open => {
                    stdout_open = self.relay(Stream::Stdout, line, options.verbose, &mut log);
                }
                line = stderr.next_line(), if stderr_open => {
                    stderr_open = self.relay(Stream::Stderr, line, options.verbose, &mut log);
                }
            }
        }

        let exit = if cancelled {
            Exit::Cancelled
        } else {
            tokio::select! {
                biased;
                () = self.control.cancelled() => Exit::Cancelled,
                status = child.wait() => Exit::Exited(status),
            }
        };

        let status = match exit {
            Exit::Cancelled => return Err(self.abort(&mut child).await),
            Exit::Exited(status) => status.map_err(|e| TaskError::SpawnFailed {
                reason: format!("{label}: {e}"),
            })?,
        };

        if !status.success() {
            let err = TaskError::ExitStatus {
                program: self.manager.clone(),
                subcommand: self.subcommand.clone(),
                code: exit_code(status),
            };
            warn!(task = %label, code = exit_code(status), "Task failed");
            self.ui.write_error_line(&err.to_string());
            return Err(err);
        }

        info!(task = %label, lines = log.len(), "Task completed");
        if let Some(message) = &self.completion_message {
            self.ui.write_line(message);
        }
        Ok(TaskOutcome::Completed { log })
    }

    /// Returns false once the stream is exhausted.
    fn relay(
        &self,
        stream: Stream,
        line: io::Result<Option<String>>,
        verbose: bool,
        log: &mut Vec<LogLine>,
    ) -> bool {
        match line {
            Ok(Some(message)) => {
                debug!(task = %self.label(), stream = stream.as_str(), "{message}");
                if verbose {
                    self.ui.write_line(&message);
                }
                log.push(LogLine { stream, message });
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!(task = %self.label(), stream = stream.as_str(), error = %e, "Stopped reading task output");
                false
            }
        }
    }

    async fn abort(&self, child: &mut Child) -> TaskError {
        warn!(task = %self.label(), "Cancelling task");
        platform::terminate(child, self.kill_after).await;
        self.cancelled_error()
    }

    fn cancelled_error(&self) -> TaskError {
        TaskError::Cancelled {
            program: self.manager.clone(),
            subcommand: self.subcommand.clone(),
        }
    }

    fn label(&self) -> String {
        format!("{} {}", self.manager, self.subcommand)
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::TaskState;
    use cadence_utils::ui::BufferUi;
    use std::sync::Arc;

    fn task(manager: &str, subcommand: &str, ui: &BufferUi) -> PackageManagerTask {
        PackageManagerTask::new(manager, subcommand, Arc::new(ui.clone()))
            .start_progress_message("test started")
            .completion_message("test completed")
    }

    #[test]
    fn test_spec_appends_arguments_after_subcommand() {
        let ui = BufferUi::new();
        let options = TaskOptions {
            args: vec!["--save".to_string(), "left-pad".to_string()],
            ..TaskOptions::default()
        };
        let spec = task("npm", "install", &ui).cwd("/work").spec(&options);
        assert_eq!(spec.to_string(), "npm install --save left-pad");
        assert_eq!(spec.cwd, Some(PathBuf::from("/work")));
    }

    #[tokio::test]
    async fn test_missing_manager_reports_not_found() {
        let ui = BufferUi::new();
        let err = task("cadence-missing-package-manager", "non-existent", &ui)
            .run(&TaskOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::CommandNotFound { .. }));
        assert!(
            ui.errors()
                .contains("`cadence-missing-package-manager non-existent` not found")
        );
        assert!(!ui.output().contains("test completed"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_is_refused() {
        let ui = BufferUi::new();
        let task = task("cadence-missing-package-manager", "install", &ui);
        task.control().cancel();

        let err = task.run(&TaskOptions::default()).await.unwrap_err();

        assert!(matches!(err, TaskError::Cancelled { .. }));
        assert_eq!(task.control().state(), TaskState::Idle);
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use cadence_utils::test_support::write_fake_executable;
        use std::time::Instant;
        use tempfile::TempDir;

        #[tokio::test]
        async fn test_dry_run_does_not_spawn() {
            let dir = TempDir::new().unwrap();
            let marker = dir.path().join("spawned");
            let pm = write_fake_executable(
                dir.path(),
                "pm",
                &format!("touch '{}'", marker.display()),
            );
            let ui = BufferUi::new();
            let task = task(pm.to_str().unwrap(), "install", &ui);

            let outcome = task
                .run(&TaskOptions {
                    dry_run: true,
                    ..TaskOptions::default()
                })
                .await
                .unwrap();

            assert!(matches!(outcome, TaskOutcome::DryRun { .. }));
            assert!(!marker.exists());
            assert_eq!(task.control().state(), TaskState::Idle);
        }

        #[tokio::test]
        async fn test_verbose_relays_output_and_completes() {
            let dir = TempDir::new().unwrap();
            let pm = write_fake_executable(
                dir.path(),
                "pm",
                "echo \"logged message $*\"\necho 'warning line' >&2",
            );
            let ui = BufferUi::new();
            let task = task(pm.to_str().unwrap(), "install", &ui);

            let outcome = task
                .run(&TaskOptions {
                    verbose: true,
                    args: vec!["--save".to_string()],
                    ..TaskOptions::default()
                })
                .await
                .unwrap();

            let output = ui.output();
            assert!(output.contains("test started"));
            assert!(output.contains("logged message install --save"));
            assert!(output.contains("test completed"));
            assert!(outcome.log().contains(&LogLine {
                stream: Stream::Stderr,
                message: "warning line".to_string(),
            }));
            assert_eq!(task.control().state(), TaskState::Finished);
        }

        #[tokio::test]
        async fn test_quiet_run_keeps_output_in_log_only() {
            let dir = TempDir::new().unwrap();
            let pm = write_fake_executable(dir.path(), "pm", "echo 'logged message'");
            let ui = BufferUi::new();

            let outcome = task(pm.to_str().unwrap(), "install", &ui)
                .run(&TaskOptions::default())
                .await
                .unwrap();

            assert!(!ui.output().contains("logged message"));
            assert_eq!(outcome.log().len(), 1);
        }

        #[tokio::test]
        async fn test_runs_in_configured_directory() {
            let dir = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let pm = write_fake_executable(dir.path(), "pm", "pwd");
            let ui = BufferUi::new();

            let outcome = task(pm.to_str().unwrap(), "install", &ui)
                .cwd(work.path())
                .run(&TaskOptions::default())
                .await
                .unwrap();

            let reported = PathBuf::from(&outcome.log()[0].message);
            assert_eq!(
                reported.canonicalize().unwrap(),
                work.path().canonicalize().unwrap()
            );
        }

        #[tokio::test]
        async fn test_non_zero_exit_is_an_error() {
            let dir = TempDir::new().unwrap();
            let pm = write_fake_executable(dir.path(), "pm", "exit 3");
            let ui = BufferUi::new();

            let err = task(pm.to_str().unwrap(), "install", &ui)
                .run(&TaskOptions::default())
                .await
                .unwrap_err();

            assert!(matches!(err, TaskError::ExitStatus { code: 3, .. }));
            assert!(ui.errors().contains("exited with code 3"));
            assert!(!ui.output().contains("test completed"));
        }

        #[tokio::test]
        async fn test_cancel_terminates_running_child() {
            let dir = TempDir::new().unwrap();
            let pm = write_fake_executable(dir.path(), "pm", "echo started\nexec sleep 30");
            let ui = BufferUi::new();
            let task = Arc::new(task(pm.to_str().unwrap(), "install", &ui));
            let control = task.control().clone();

            let runner = Arc::clone(&task);
            let handle = tokio::spawn(async move { runner.run(&TaskOptions::default()).await });
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(control.state(), TaskState::Running);

            let started = Instant::now();
            control.cancel();
            control.wait_settled().await;
            let err = handle.await.unwrap().unwrap_err();

            assert!(started.elapsed() < Duration::from_secs(5));
            assert!(matches!(err, TaskError::Cancelled { .. }));
            assert_eq!(control.state(), TaskState::Finished);
        }

        #[tokio::test]
        async fn test_cancel_kills_child_ignoring_sigterm() {
            let dir = TempDir::new().unwrap();
            let pm = write_fake_executable(
                dir.path(),
                "pm",
                "trap '' TERM\necho ready\nwhile true; do sleep 1; done",
            );
            let ui = BufferUi::new();
            let task = Arc::new(
                task(pm.to_str().unwrap(), "install", &ui).kill_after(Duration::from_millis(200)),
            );
            let control = task.control().clone();

            let runner = Arc::clone(&task);
            let handle = tokio::spawn(async move { runner.run(&TaskOptions::default()).await });
            tokio::time::sleep(Duration::from_millis(200)).await;

            let started = Instant::now();
            control.cancel();
            let err = tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("task should be killed")
                .unwrap()
                .unwrap_err();

            assert!(started.elapsed() >= Duration::from_millis(200));
            assert!(matches!(err, TaskError::Cancelled { .. }));
        }
    }
}
