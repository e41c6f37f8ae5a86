//! Log entry passed from the logger to its sink.

use std::error::Error;
use std::fmt::Write;

use crate::severity::Severity;

/// A single log call.
///
/// Entries are never stored as objects; only their rendered text reaches
/// the console or the daily file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,

    /// Short label identifying the origin (e.g. "GlobalFault", "Sync")
    pub tag: Option<String>,

    /// Text to print and persist, error trace included
    pub message: String,

    /// Rendered trace of the attached error, if any
    pub error: Option<String>,
}

impl LogEntry {
    pub fn new(severity: Severity, tag: Option<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            tag,
            message: message.into(),
            error: None,
        }
    }

    /// Attach an error, rendering its source chain.
    pub fn with_error(self, error: &(dyn Error + 'static)) -> Self {
        self.with_error_trace(render_error(error))
    }

    /// Attach an already rendered error trace.
    ///
    /// An empty message is replaced by the trace; otherwise the trace
    /// follows the message on the next line.
    pub fn with_error_trace(mut self, trace: impl Into<String>) -> Self {
        let trace = trace.into();
        if self.message.is_empty() {
            self.message = trace.clone();
        } else {
            self.message.push('\n');
            self.message.push_str(&trace);
        }
        self.error = Some(trace);
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().filter(|tag| !tag.is_empty())
    }

    /// Only entries with both a tag and a message may reach the file.
    pub fn is_persistable(&self) -> bool {
        self.tag().is_some() && !self.message.is_empty()
    }
}

/// Render an error and its `source()` chain.
///
/// ```text
/// failed to save file
///
/// Caused by:
///     0: disk full
/// ```
pub fn render_error(error: &(dyn Error + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    if source.is_some() {
        out.push_str("\n\nCaused by:");
    }
    let mut index = 0;
    while let Some(cause) = source {
        let _ = write!(out, "\n    {}: {}", index, cause);
        index += 1;
        source = cause.source();
    }
    out
}
