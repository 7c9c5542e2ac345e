//! Colored CLI display utilities for supervised runs.
//!
//! Child output goes to stdout untouched; status lines go to stderr so they
//! never interleave with what a downstream pipe consumes.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::subprocess::{RunOutcome, Termination};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Write one content unit followed by a newline.
///
/// # Errors
///
/// Returns an error if stdout is closed.
pub fn write_unit(out: &mut impl Write, unit: &[u8]) -> io::Result<()> {
    out.write_all(unit)?;
    out.write_all(b"\n")
}

/// Print process start information.
pub fn print_run_start(executable: &str, pid: Option<u32>) {
    eprintln!(
        "{} {} {} {}",
        timestamp().dimmed(),
        "[START]".blue().bold(),
        executable.cyan(),
        pid.map_or(String::new(), |p| format!("pid={p}")).dimmed()
    );
}

/// Print how a run ended.
pub fn print_outcome(executable: &str, outcome: &RunOutcome) {
    let ts = timestamp();
    let status = outcome
        .status
        .map_or_else(|| "status unknown".to_string(), |s| s.to_string());
    match outcome.termination {
        Termination::Exited if outcome.success() => eprintln!(
            "{} {} {} {}",
            ts.dimmed(),
            "[DONE]".green().bold(),
            executable,
            status.dimmed()
        ),
        Termination::Exited => eprintln!(
            "{} {} {} {}",
            ts.dimmed(),
            "[FAILED]".red().bold(),
            executable,
            status.red()
        ),
        Termination::TimedOut => eprintln!(
            "{} {} {} killed after timeout",
            ts.dimmed(),
            "[TIMEOUT]".yellow().bold(),
            executable
        ),
        Termination::Killed => eprintln!(
            "{} {} {} killed by user",
            ts.dimmed(),
            "[KILLED]".magenta().bold(),
            executable
        ),
    }
    let _ = io::stderr().flush();
}

/// Print an error that prevented a run from starting.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message.red());
    let _ = io::stderr().flush();
}
