//! Subprocess spawning and supervision.
//!
//! [`SubProcess::run`] launches the child and returns straight away. Four
//! tasks then carry the run to completion:
//!
//! - two content scanners, one per output stream, feeding the shared sink;
//! - a completion barrier that closes the sink once both scanners are done;
//! - a lifecycle task that races the barrier against the timeout and any
//!   kill request, then reaps the child.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;

use super::{
    ContentScanner, OutputSink, ProcessHandle, RunOutcome, StreamKind, SubprocessError,
    Termination, DEFAULT_MAX_UNIT_LEN,
};

/// Ceiling applied when no timeout, or a zero timeout, is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Number of content scanners per run.
const SCANNER_COUNT: usize = 2;

#[cfg(unix)]
const SIGKILL: i32 = 9;

/// Builder describing one subprocess run.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use subprocess_supervisor::subprocess::{output_channel, SubProcess};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let (sink, mut output) = output_channel(64);
/// let handle = SubProcess::new("python")
///     .arg("main.py")
///     .timeout(Duration::from_secs(30))
///     .run(sink)?;
///
/// while let Some(line) = output.recv().await {
///     println!("{}", String::from_utf8_lossy(&line));
/// }
/// let outcome = handle.outcome().await;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SubProcess {
    executable: String,
    args: Vec<String>,
    timeout: Duration,
    default_timeout: Duration,
    max_unit_len: usize,
}

impl SubProcess {
    /// Describe a run of `executable`, resolved with the usual `PATH` rules.
    #[must_use]
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            timeout: Duration::ZERO,
            default_timeout: DEFAULT_TIMEOUT,
            max_unit_len: DEFAULT_MAX_UNIT_LEN,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the timeout. Zero means the default ceiling, not "no timeout".
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the longest line delivered before a stream's scan is abandoned.
    #[must_use]
    pub fn max_unit_len(mut self, len: usize) -> Self {
        self.max_unit_len = len;
        self
    }

    /// Apply the default ceiling and line limit from a loaded config.
    #[must_use]
    pub fn with_config(mut self, config: &SupervisorConfig) -> Self {
        self.default_timeout = config.default_timeout();
        self.max_unit_len = config.max_unit_len;
        self
    }

    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// The timeout that will actually be enforced.
    #[must_use]
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            self.default_timeout
        } else {
            self.timeout
        }
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Start the child and begin streaming its output into `sink`.
    ///
    /// Returns as soon as the child is running. The caller observes
    /// completion by draining the matching output stream until it ends.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SubprocessError::Start`] if the OS cannot launch the child,
    /// or [`SubprocessError::Setup`] if an output pipe is missing. In both
    /// cases the sink is closed before returning and no child is left running.
    pub fn run(self, sink: OutputSink) -> Result<ProcessHandle, SubprocessError> {
        let timeout = self.effective_timeout();

        let mut child = match self.build_command().spawn() {
            Ok(child) => child,
            Err(source) => {
                sink.close();
                tracing::debug!(executable = %self.executable, error = %source, "Spawn failed");
                return Err(SubprocessError::Start {
                    executable: self.executable,
                    source,
                });
            }
        };

        let (stdout, stderr) = match take_pipes(&mut child) {
            Ok(pipes) => pipes,
            Err(stream) => return Err(abort_setup(child, sink, self.executable, stream)),
        };

        let pid = child.id();
        tracing::info!(
            executable = %self.executable,
            pid = ?pid,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Process started"
        );

        let (done_tx, done_rx) = mpsc::channel(SCANNER_COUNT);
        tokio::spawn(
            ContentScanner::new(stdout, StreamKind::Stdout)
                .max_unit_len(self.max_unit_len)
                .run(sink.producer(), done_tx.clone()),
        );
        tokio::spawn(
            ContentScanner::new(stderr, StreamKind::Stderr)
                .max_unit_len(self.max_unit_len)
                .run(sink.producer(), done_tx),
        );

        let finished = CancellationToken::new();
        tokio::spawn(completion_barrier(done_rx, sink, finished.clone()));

        let kill = CancellationToken::new();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        tokio::spawn(supervise(
            child,
            Lifecycle {
                executable: self.executable.clone(),
                pid,
                timeout,
                finished,
                kill: kill.clone(),
                outcome: outcome_tx,
            },
        ));

        Ok(ProcessHandle::new(self.executable, pid, kill, outcome_rx))
    }
}

/// Detach both output pipes from a freshly spawned child.
fn take_pipes(child: &mut Child) -> Result<(ChildStdout, ChildStderr), StreamKind> {
    let stdout = child.stdout.take().ok_or(StreamKind::Stdout)?;
    let stderr = child.stderr.take().ok_or(StreamKind::Stderr)?;
    Ok((stdout, stderr))
}

/// Undo a spawn whose pipes could not be attached: close the sink, kill the
/// child (`kill_on_drop` reaps it) and report which stream was missing.
fn abort_setup(
    mut child: Child,
    sink: OutputSink,
    executable: String,
    stream: StreamKind,
) -> SubprocessError {
    sink.close();
    if let Err(e) = child.start_kill() {
        tracing::debug!(executable = %executable, error = %e, "Kill after setup failure failed");
    }
    SubprocessError::Setup { executable, stream }
}

/// Wait for every scanner to finish, then close the sink.
///
/// This task holds the last sink handle, so the close happens here and only
/// here.
async fn completion_barrier(
    mut done: mpsc::Receiver<StreamKind>,
    sink: OutputSink,
    finished: CancellationToken,
) {
    for _ in 0..SCANNER_COUNT {
        match done.recv().await {
            Some(stream) => tracing::trace!(stream = %stream, "Stream drained"),
            None => break,
        }
    }
    sink.close();
    finished.cancel();
}

struct Lifecycle {
    executable: String,
    pid: Option<u32>,
    timeout: Duration,
    finished: CancellationToken,
    kill: CancellationToken,
    outcome: watch::Sender<Option<RunOutcome>>,
}

/// Race completion against the timeout and kill requests, then reap.
async fn supervise(mut child: Child, lc: Lifecycle) {
    let Lifecycle {
        executable,
        pid,
        timeout,
        finished,
        kill,
        outcome,
    } = lc;

    let mut termination = tokio::select! {
        biased;
        () = finished.cancelled() => Termination::Exited,
        () = tokio::time::sleep(timeout) => {
            tracing::warn!(executable = %executable, pid = ?pid, "Subprocess timed out, killing");
            if force_kill(&mut child, &executable) {
                Termination::TimedOut
            } else {
                Termination::Exited
            }
        }
        () = kill.cancelled() => {
            if force_kill(&mut child, &executable) {
                Termination::Killed
            } else {
                Termination::Exited
            }
        }
    };

    // The sink always closes before the child is reaped.
    finished.cancelled().await;

    let status = if termination == Termination::Exited {
        // The child may have closed its pipes and kept running.
        tokio::select! {
            biased;
            status = child.wait() => status,
            () = kill.cancelled() => {
                if force_kill(&mut child, &executable) {
                    termination = Termination::Killed;
                }
                child.wait().await
            }
        }
    } else {
        child.wait().await
    };

    // A kill that landed after the child exited on its own changes nothing.
    if termination != Termination::Exited {
        if let Ok(status) = &status {
            if !was_force_killed(status) {
                termination = Termination::Exited;
            }
        }
    }

    let status = match status {
        Ok(status) => {
            tracing::debug!(executable = %executable, pid = ?pid, %status, ?termination, "Process reaped");
            Some(status)
        }
        Err(e) => {
            tracing::warn!(executable = %executable, pid = ?pid, error = %e, "Failed to reap process");
            None
        }
    };

    let _ = outcome.send(Some(RunOutcome {
        termination,
        status,
    }));
}

/// Send SIGKILL (or the platform equivalent) unless the child has already
/// exited. Returns whether a kill was actually delivered.
fn force_kill(child: &mut Child, executable: &str) -> bool {
    if let Ok(Some(status)) = child.try_wait() {
        tracing::debug!(executable = %executable, %status, "Kill skipped, process already exited");
        return false;
    }
    match child.start_kill() {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(executable = %executable, error = %e, "Kill failed, process already exited");
            false
        }
    }
}

#[cfg(unix)]
fn was_force_killed(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    status.signal() == Some(SIGKILL)
}

#[cfg(not(unix))]
fn was_force_killed(_status: &ExitStatus) -> bool {
    true
}
