//! Caller-side handle to a running subprocess.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::RunOutcome;

/// Handle returned by a successful [`SubProcess::run`](crate::subprocess::SubProcess::run).
///
/// The child itself is owned by the supervising task; the handle only
/// carries the kill request and the out-of-band outcome. Cloning the handle
/// is cheap, so a signal handler can hold its own copy.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    executable: String,
    pid: Option<u32>,
    kill: CancellationToken,
    outcome: watch::Receiver<Option<RunOutcome>>,
}

impl ProcessHandle {
    pub(crate) fn new(
        executable: String,
        pid: Option<u32>,
        kill: CancellationToken,
        outcome: watch::Receiver<Option<RunOutcome>>,
    ) -> Self {
        Self {
            executable,
            pid,
            kill,
            outcome,
        }
    }

    /// The executable this handle supervises.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// OS process id captured at spawn time.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Force-terminate the child immediately.
    ///
    /// Never blocks. Calling this after the child has exited, or more than
    /// once, is harmless.
    pub fn kill(&self) {
        if self.kill.is_cancelled() || self.is_finished() {
            tracing::debug!(executable = %self.executable, pid = ?self.pid, "Kill ignored, process already finishing");
            return;
        }
        tracing::info!(executable = %self.executable, pid = ?self.pid, "Killing due to user request");
        self.kill.cancel();
    }

    /// Whether the child has been reaped and its outcome published.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Wait for the run to finish and report how it ended.
    ///
    /// The output sink closes before the outcome is published. Returns `None`
    /// only if the supervising task was torn down early, for example by
    /// runtime shutdown.
    pub async fn outcome(&self) -> Option<RunOutcome> {
        let mut rx = self.outcome.clone();
        let result = rx.wait_for(Option::is_some).await;
        result.ok().and_then(|outcome| *outcome)
    }
}
