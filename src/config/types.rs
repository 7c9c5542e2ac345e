//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::subprocess::{DEFAULT_CHANNEL_BUFFER, DEFAULT_MAX_UNIT_LEN, DEFAULT_TIMEOUT};

/// Configuration for supervised runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Ceiling applied when a run is given no timeout, in seconds.
    pub default_timeout_secs: u64,
    /// In-flight content units between scanners and the consumer.
    pub channel_capacity: usize,
    /// Longest line delivered before a stream's scan is abandoned.
    pub max_unit_len: usize,
}

impl SupervisorConfig {
    /// The default ceiling as a [`Duration`]. Zero falls back to one hour.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        if self.default_timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.default_timeout_secs)
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            channel_capacity: DEFAULT_CHANNEL_BUFFER,
            max_unit_len: DEFAULT_MAX_UNIT_LEN,
        }
    }
}
