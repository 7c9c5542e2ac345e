//! Human-readable file metadata.
//!
//! Renders a single line such as
//! `report.txt (File): 1.5 kB. Modified: 5 minutes ago. [Size: 1500, Blocks: 8]`.

mod humanize;

pub use humanize::*;

use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

/// File metadata paired with a display name.
#[derive(Debug, Clone)]
pub struct HumanizedFileInfo {
    name: String,
    metadata: Metadata,
}

impl HumanizedFileInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }

    /// Stat `path` and name the result after its final component.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from reading the metadata.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        Ok(Self::new(name, metadata))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.metadata.is_dir() {
            "Dir"
        } else {
            "File"
        }
    }

    /// Render the description relative to `now`.
    #[must_use]
    pub fn render_at(&self, now: DateTime<Utc>) -> String {
        let modified = self.metadata.modified().map_or_else(
            |_| "unknown".to_string(),
            |t| format_relative(DateTime::<Utc>::from(t), now),
        );
        let mut line = format!(
            "{} ({}): {}. Modified: {}.",
            self.name,
            self.kind(),
            format_size(self.metadata.len()),
            modified
        );
        if let Some(stat) = stat_summary(&self.metadata) {
            line.push_str(&format!(" [{stat}]"));
        }
        line
    }
}

impl fmt::Display for HumanizedFileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_at(Utc::now()))
    }
}

#[cfg(unix)]
fn stat_summary(metadata: &Metadata) -> Option<String> {
    use std::os::unix::fs::MetadataExt;

    let summary = format!("Size: {}, Blocks: {}", metadata.size(), metadata.blocks());
    #[cfg(target_os = "macos")]
    let summary = {
        use std::os::macos::fs::MetadataExt as _;
        format!("{summary}, Flags: {}", metadata.st_flags())
    };
    Some(summary)
}

#[cfg(not(unix))]
fn stat_summary(_metadata: &Metadata) -> Option<String> {
    None
}
