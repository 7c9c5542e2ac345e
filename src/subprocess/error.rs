//! Subprocess error types.

use std::fmt;

/// Which captured output stream a scanner reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Errors returned by [`SubProcess::run`](crate::subprocess::SubProcess::run).
///
/// Only failures before the child is running are reported here. Everything
/// that happens afterwards is observed through the output sink closing.
#[derive(thiserror::Error, Debug)]
pub enum SubprocessError {
    /// An output pipe could not be attached to the child.
    #[error("could not attach {stream} pipe for {executable}")]
    Setup {
        executable: String,
        stream: StreamKind,
    },

    /// The OS could not launch the child.
    #[error("could not start process {executable}: {source}")]
    Start {
        executable: String,
        source: std::io::Error,
    },
}

impl SubprocessError {
    /// The executable the failed run was attempting to launch.
    #[must_use]
    pub fn executable(&self) -> &str {
        match self {
            Self::Setup { executable, .. } | Self::Start { executable, .. } => executable,
        }
    }

    /// Whether the executable could not be found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Start { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
