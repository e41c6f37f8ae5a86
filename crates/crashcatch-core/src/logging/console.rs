//! Console sink: human-readable lines on stderr (or any plugged-in writer).

use std::fmt::Write as FmtWrite;
use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use super::format::TIME_FORMAT;
use crate::severity::Severity;

/// Writes entries as `<timestamp> <L>/<tag>: <line>`, one output line per
/// message line.
///
/// Write failures are ignored; the console is the last place to report to.
#[derive(Clone)]
pub struct ConsoleSink {
    writer: Arc<BoxMakeWriter>,
}

impl ConsoleSink {
    /// Console backed by any `MakeWriter`, e.g. a closure returning a buffer.
    pub fn new<M>(make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            writer: Arc::new(BoxMakeWriter::new(make_writer)),
        }
    }

    pub fn stderr() -> Self {
        Self::new(std::io::stderr)
    }

    /// Print an entry.
    pub fn print(
        &self,
        timestamp: NaiveDateTime,
        severity: Severity,
        tag: Option<&str>,
        message: &str,
    ) {
        let prefix = format!(
            "{} {}/{}",
            timestamp.format(TIME_FORMAT),
            severity.code(),
            tag.unwrap_or("")
        );
        let mut out = String::with_capacity(prefix.len() + message.len() + 8);
        for line in message.split('\n') {
            let _ = writeln!(out, "{}: {}", prefix, line);
        }
        self.write_all(&out);
    }

    /// Report a problem of the logging pipeline itself, stamped by the
    /// caller's clock.
    pub fn warn(&self, timestamp: NaiveDateTime, tag: &str, message: &str) {
        self.print(timestamp, Severity::Warn, Some(tag), message);
    }

    fn write_all(&self, text: &str) {
        let mut writer = self.writer.make_writer();
        let _ = writer.write_all(text.as_bytes());
        let _ = writer.flush();
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink").finish_non_exhaustive()
    }
}
