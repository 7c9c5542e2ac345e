//! Subprocess module tests.

mod kill_test;
mod timeout_test;

use std::time::{Duration, Instant};

use bytes::Bytes;
use subprocess_supervisor::subprocess::{OutputStream, SubProcess};

/// Run a script through `sh -c`.
pub fn sh(script: &str) -> SubProcess {
    SubProcess::new("sh").arg("-c").arg(script)
}

/// Drain `output` until it closes, failing the test if that takes longer than `limit`.
pub async fn drain_within(output: OutputStream, limit: Duration) -> (Vec<Bytes>, Duration) {
    let started = Instant::now();
    let units = tokio::time::timeout(limit, output.collect_all())
        .await
        .expect("output sink did not close in time");
    (units, started.elapsed())
}

pub fn as_strings(units: &[Bytes]) -> Vec<String> {
    units
        .iter()
        .map(|u| String::from_utf8_lossy(u).into_owned())
        .collect()
}

/// Whether a process with this pid still exists (zombies included).
pub fn is_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    kill(Pid::from_raw(i32::try_from(pid).unwrap()), None).is_ok()
}

/// Verify all public subprocess types are exported from the library.
#[test]
fn test_all_subprocess_types_exported() {
    use subprocess_supervisor::subprocess::{
        output_channel, BufferPair, ContentScanner, ProcessHandle, RunOutcome, StreamKind,
        SubprocessError, Termination, DEFAULT_CHANNEL_BUFFER, DEFAULT_MAX_UNIT_LEN,
        DEFAULT_TIMEOUT,
    };

    let _ = output_channel(DEFAULT_CHANNEL_BUFFER);
    let _ = BufferPair::new();
    let _ = ContentScanner::new(tokio::io::empty(), StreamKind::Stdout)
        .max_unit_len(DEFAULT_MAX_UNIT_LEN);
    let _ = SubProcess::new("true").timeout(DEFAULT_TIMEOUT);

    let _: fn(&ProcessHandle) -> Option<u32> = ProcessHandle::pid;
    let _: fn(&SubprocessError) -> bool = SubprocessError::is_not_found;
    let _ = RunOutcome {
        termination: Termination::Exited,
        status: None,
    };
}
