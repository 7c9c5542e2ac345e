//! Run outcome reporting.

use std::process::ExitStatus;

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The child exited on its own.
    Exited,
    /// The timeout elapsed and the child was force-killed.
    TimedOut,
    /// The caller killed the child.
    Killed,
}

/// Out-of-band result of a finished run.
///
/// This is never sent through the output sink; the sink only ever carries
/// content units and its closure.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    /// How the run ended.
    pub termination: Termination,
    /// Exit status, if the child could be reaped.
    pub status: Option<ExitStatus>,
}

impl RunOutcome {
    /// Whether the child exited on its own with a zero status.
    #[must_use]
    pub fn success(&self) -> bool {
        self.termination == Termination::Exited && self.status.is_some_and(|s| s.success())
    }

    /// Exit code in shell convention: the child's own code when it has one,
    /// 124 for a timeout, 130 for a user kill, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.termination {
            Termination::TimedOut => 124,
            Termination::Killed => 130,
            Termination::Exited => self.status.and_then(|s| s.code()).unwrap_or(1),
        }
    }
}
