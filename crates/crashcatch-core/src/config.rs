//! Logger thresholds.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatchError, CatchResult};
use crate::severity::Severity;

/// Minimum severities for the console and file sinks.
///
/// Both thresholds are always set together; there are no per-field setters
/// and a config file missing either field is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Entries at or above this severity are printed to the console sink
    pub print_threshold: Severity,

    /// Entries at or above this severity are appended to the daily file
    pub output_threshold: Severity,
}

impl LoggerConfig {
    pub fn new(print_threshold: Severity, output_threshold: Severity) -> Self {
        Self {
            print_threshold,
            output_threshold,
        }
    }

    pub fn should_print(&self, severity: Severity) -> bool {
        severity >= self.print_threshold
    }

    pub fn should_persist(&self, severity: Severity) -> bool {
        severity >= self.output_threshold
    }

    /// Load a config from a JSON file such as
    /// `{"print_threshold": "debug", "output_threshold": "warn"}`.
    pub fn load(path: impl AsRef<Path>) -> CatchResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CatchError::Config(format!("{}: {}", path.display(), e)))
    }
}

impl Default for LoggerConfig {
    /// Errors only, on both sinks.
    fn default() -> Self {
        Self::new(Severity::Error, Severity::Error)
    }
}
