//! End-to-end lifecycle scenarios driven through the public library API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cadence::{
    CliOrchestrator, Command, CommandContext, CommandOutput, CommandRegistry, ErrorKind,
    ExitCode, InstrumentationPhase, InterruptCoordinator, InterruptEvent, MemoryReportSink,
    MockSignalSource, RecordingTerminator, RunState, SignalSource,
};
use serial_test::serial;

#[derive(Default)]
struct Observed {
    interrupts: AtomicUsize,
    interruption_handled: AtomicBool,
}

/// Sleeps through `run`, then sleeps again through cleanup.
struct SlowCommand {
    observed: Arc<Observed>,
    run_for: Duration,
    cleanup_for: Duration,
}

#[async_trait]
impl Command for SlowCommand {
    fn name(&self) -> &str {
        "fake"
    }

    async fn run(&self, _ctx: &CommandContext) -> anyhow::Result<CommandOutput> {
        tokio::time::sleep(self.run_for).await;
        Ok(CommandOutput::success())
    }

    async fn on_interrupt(&self, _ctx: &CommandContext) -> anyhow::Result<()> {
        self.observed.interrupts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.cleanup_for).await;
        self.observed.interruption_handled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Asks the coordinator to exit from inside `run`.
struct ExitingCommand {
    coordinator: InterruptCoordinator,
    observed: Arc<Observed>,
}

#[async_trait]
impl Command for ExitingCommand {
    fn name(&self) -> &str {
        "exit"
    }

    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<CommandOutput> {
        self.coordinator.request_exit(4)?;
        ctx.wait_interrupted().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(CommandOutput::success())
    }

    async fn on_interrupt(&self, _ctx: &CommandContext) -> anyhow::Result<()> {
        self.observed.interrupts.fetch_add(1, Ordering::SeqCst);
        self.observed.interruption_handled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct Setup {
    orchestrator: CliOrchestrator,
    source: Arc<MockSignalSource>,
    terminator: RecordingTerminator,
    reports: MemoryReportSink,
    observed: Arc<Observed>,
}

fn setup(coordinator: InterruptCoordinator, run_for: Duration, cleanup_for: Duration) -> Setup {
    let observed = Arc::new(Observed::default());
    let slow = Arc::clone(&observed);
    let exiting = Arc::clone(&observed);
    let exit_coordinator = coordinator.clone();
    let registry = CommandRegistry::new()
        .with("fake", move || {
            Arc::new(SlowCommand {
                observed: Arc::clone(&slow),
                run_for,
                cleanup_for,
            }) as Arc<dyn Command>
        })
        .with("exit", move || {
            Arc::new(ExitingCommand {
                coordinator: exit_coordinator.clone(),
                observed: Arc::clone(&exiting),
            }) as Arc<dyn Command>
        });

    let source = Arc::new(MockSignalSource::new());
    let terminator = RecordingTerminator::new();
    let reports = MemoryReportSink::new();
    let orchestrator = CliOrchestrator::new(registry, coordinator)
        .with_signal_source(Arc::clone(&source) as Arc<dyn SignalSource>)
        .with_terminator(Arc::new(terminator.clone()))
        .with_report_sink(Arc::new(reports.clone()));

    Setup {
        orchestrator,
        source,
        terminator,
        reports,
        observed,
    }
}

fn interrupt_after(source: &Arc<MockSignalSource>, delay: Duration) {
    let source = Arc::clone(source);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        source.emit(InterruptEvent::Interrupt);
    });
}

#[tokio::test]
async fn test_interrupt_cleanup_finishes_before_termination() {
    let s = setup(
        InterruptCoordinator::new(),
        Duration::from_millis(50),
        Duration::from_millis(500),
    );
    interrupt_after(&s.source, Duration::from_millis(10));

    let started = Instant::now();
    let err = s.orchestrator.run(vec!["fake".to_string()]).await.unwrap_err();

    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(err.kind(), ErrorKind::Interrupted);
    assert!(s.observed.interruption_handled.load(Ordering::SeqCst));
    assert_eq!(s.observed.interrupts.load(Ordering::SeqCst), 1);
    assert_eq!(s.terminator.codes(), vec![ExitCode::INTERRUPTED]);
    assert_eq!(s.orchestrator.state(), Some(RunState::Done));
}

#[tokio::test]
async fn test_uninterrupted_run_never_calls_cleanup() {
    let s = setup(
        InterruptCoordinator::new(),
        Duration::from_millis(20),
        Duration::ZERO,
    );

    let output = s.orchestrator.run(vec!["fake".to_string()]).await.unwrap();

    assert!(output.exit_code.is_success());
    assert_eq!(s.observed.interrupts.load(Ordering::SeqCst), 0);
    assert!(!s.terminator.terminated());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!s.source.emit(InterruptEvent::Interrupt));
    assert_eq!(s.observed.interrupts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_exit_request_from_command_goes_through_cleanup() {
    let s = setup(InterruptCoordinator::new(), Duration::ZERO, Duration::ZERO);

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        s.orchestrator.run(vec!["exit".to_string()]),
    )
    .await
    .unwrap()
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Interrupted);
    assert_eq!(err.to_exit_code(), ExitCode::from(4));
    assert!(s.observed.interruption_handled.load(Ordering::SeqCst));
    assert_eq!(s.terminator.codes(), vec![ExitCode::from(4)]);
}

#[tokio::test]
async fn test_report_covers_every_phase_once() {
    let s = setup(
        InterruptCoordinator::new(),
        Duration::from_millis(30),
        Duration::ZERO,
    );

    s.orchestrator.run(vec!["fake".to_string()]).await.unwrap();

    let reports = s.reports.reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.command, "fake");
    assert_eq!(report.outcome.as_deref(), Some("success"));
    assert_eq!(
        report.start_order(),
        vec![
            InstrumentationPhase::Init,
            InstrumentationPhase::Command,
            InstrumentationPhase::Shutdown,
        ]
    );
    let command = report.phase(InstrumentationPhase::Command).unwrap();
    assert!(command.duration_ms >= 25.0);
}

#[tokio::test]
#[serial]
async fn test_global_coordinator_is_released_between_runs() {
    let coordinator = InterruptCoordinator::global();
    let s = setup(
        coordinator.clone(),
        Duration::from_millis(10),
        Duration::ZERO,
    );

    s.orchestrator.run(vec!["fake".to_string()]).await.unwrap();
    assert!(!coordinator.is_capturing());
    assert!(!coordinator.has_handler());

    interrupt_after(&s.source, Duration::from_millis(50));
    let s2 = setup(
        coordinator.clone(),
        Duration::from_millis(100),
        Duration::from_millis(10),
    );
    interrupt_after(&s2.source, Duration::from_millis(20));
    let err = s2.orchestrator.run(vec!["fake".to_string()]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Interrupted);
    assert_eq!(s.observed.interrupts.load(Ordering::SeqCst), 0);
    assert_eq!(s2.observed.interrupts.load(Ordering::SeqCst), 1);
    assert!(!coordinator.is_capturing());
}

#[tokio::test]
#[serial]
async fn test_global_coordinator_rejects_nested_capture() {
    let coordinator = InterruptCoordinator::global();
    let outer = Arc::new(MockSignalSource::new());
    let _guard = coordinator
        .capture(Arc::clone(&outer) as Arc<dyn SignalSource>)
        .unwrap();

    let s = setup(coordinator.clone(), Duration::ZERO, Duration::ZERO);
    let err = s.orchestrator.run(vec!["fake".to_string()]).await.unwrap_err();

    assert!(err.is_misuse());
    assert!(!s.terminator.terminated());
}
