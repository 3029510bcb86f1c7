//! Signal sources
//!
//! [`ProcessSignalSource`] listens for Ctrl-C, SIGTERM on unix, and
//! optionally a raw `0x03` byte on a terminal stdin.

use std::io::{IsTerminal, Read};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::{InterruptEvent, control_bytes};
use cadence_utils::error::InterruptError;

/// Host capability that delivers interrupt events.
///
/// Each call to [`subscribe`](Self::subscribe) yields a fresh stream. The
/// stream ends (and the source's background listeners wind down) once the
/// receiver is dropped.
pub trait SignalSource: Send + Sync {
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<InterruptEvent>, InterruptError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        "signal source"
    }
}

/// The real process: Ctrl-C, SIGTERM on unix, and optionally a raw `0x03`
/// on stdin.
///
/// Must be subscribed from inside a tokio runtime.
#[derive(Debug, Clone, Copy)]
pub struct ProcessSignalSource {
    watch_stdin: bool,
}

impl Default for ProcessSignalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSignalSource {
    /// Watch stdin for `0x03` only on Windows terminals, where console
    /// input in raw mode swallows Ctrl-C instead of raising a signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            watch_stdin: cfg!(windows) && std::io::stdin().is_terminal(),
        }
    }

    #[must_use]
    pub fn watch_stdin(mut self, watch: bool) -> Self {
        self.watch_stdin = watch;
        self
    }
}

impl SignalSource for ProcessSignalSource {
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<InterruptEvent>, InterruptError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|e| InterruptError::SignalSetup {
                reason: format!("no tokio runtime: {e}"),
            })?;
        let (tx, rx) = mpsc::unbounded_channel();

        let ctrl_c_tx = tx.clone();
        handle.spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                debug!("Received Ctrl-C");
                if ctrl_c_tx.send(InterruptEvent::Interrupt).is_err() {
                    break;
                }
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut terminate = {
                let _entered = handle.enter();
                signal(SignalKind::terminate()).map_err(|e| InterruptError::SignalSetup {
                    reason: format!("SIGTERM handler: {e}"),
                })?
            };
            let term_tx = tx.clone();
            handle.spawn(async move {
                while terminate.recv().await.is_some() {
                    debug!("Received SIGTERM");
                    if term_tx.send(InterruptEvent::Terminate).is_err() {
                        break;
                    }
                }
            });
        }

        if self.watch_stdin {
            spawn_stdin_reader(tx);
        }

        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

/// Forward every `0x03` read from stdin until EOF or the receiver goes away.
fn spawn_stdin_reader(tx: mpsc::UnboundedSender<InterruptEvent>) {
    let spawned = std::thread::Builder::new()
        .name("cadence-stdin".to_string())
        .spawn(move || {
            let mut stdin = std::io::stdin();
            let mut buf = [0u8; 64];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        for _ in 0..control_bytes(&buf[..n]) {
                            debug!("Received control byte on stdin");
                            if tx.send(InterruptEvent::ControlByte).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(error = %e, "Stopped reading stdin");
                        break;
                    }
                }
            }
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Could not start stdin reader; control byte interrupts disabled");
    }
}
