//! Platform-specific child termination.

use std::time::Duration;

use tokio::process::Child;
use tracing::debug;

/// Stop `child`: SIGTERM to its process group, then SIGKILL once
/// `kill_after` elapses. Elsewhere the child is killed outright.
pub(crate) async fn terminate(child: &mut Child, kill_after: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(pid as i32);
        if let Err(e) = killpg(pgid, Signal::SIGTERM) {
            debug!(pid, error = %e, "SIGTERM to task process group failed");
        }
        match tokio::time::timeout(kill_after, child.wait()).await {
            Ok(_) => return,
            Err(_) => {
                tracing::warn!(pid, "Task ignored SIGTERM; killing");
                let _ = killpg(pgid, Signal::SIGKILL);
            }
        }
    }

    #[cfg(not(unix))]
    let _ = kill_after;

    if let Err(e) = child.kill().await {
        debug!(error = %e, "Killing task process failed");
    }
}
