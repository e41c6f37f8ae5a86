//! Custom tracing Layer that routes every event through the logger.
//!
//! This layer is what lets crashcatch intercept all structured log output:
//! any `tracing` event emitted in the process becomes a [`LogEntry`] and is
//! filtered by the logger's thresholds like a direct call.
//!
//! Field mapping:
//! - level → severity (`assert = true` raises it to `Assert`)
//! - `tag` field → tag, falling back to the event target
//! - `message` → message, other fields appended as `key=value`
//! - `error` field → attached error trace

use std::cell::Cell;
use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::entry::{render_error, LogEntry};
use super::logger::LevelFilteredLogger;
use crate::severity::Severity;

thread_local! {
    static IN_LAYER: Cell<bool> = const { Cell::new(false) };
}

/// Resets the re-entrancy flag even if a sink unwinds.
struct ReentrancyGuard;

impl ReentrancyGuard {
    fn enter() -> Option<Self> {
        if IN_LAYER.with(|flag| flag.replace(true)) {
            None
        } else {
            Some(ReentrancyGuard)
        }
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        IN_LAYER.with(|flag| flag.set(false));
    }
}

/// A tracing Layer feeding a [`LevelFilteredLogger`].
#[derive(Clone)]
pub struct CatchLayer {
    logger: Arc<LevelFilteredLogger>,
}

impl CatchLayer {
    pub fn new(logger: Arc<LevelFilteredLogger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<LevelFilteredLogger> {
        &self.logger
    }
}

impl<S> Layer<S> for CatchLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // Events emitted while a sink is running (e.g. by a custom sink) are dropped
        let Some(_guard) = ReentrancyGuard::enter() else {
            return;
        };

        let metadata = event.metadata();

        let mut visitor = CatchVisitor::default();
        event.record(&mut visitor);

        let severity = if visitor.assert {
            Severity::Assert
        } else {
            Severity::from(*metadata.level())
        };
        let tag = visitor
            .tag
            .take()
            .unwrap_or_else(|| metadata.target().to_string());

        let mut message = String::new();
        if let Some(scope) = ctx.event_scope(event) {
            let spans: Vec<&str> = scope.from_root().map(|span| span.name()).collect();
            if !spans.is_empty() {
                let _ = write!(message, "[{}] ", spans.join(" > "));
            }
        }
        message.push_str(visitor.message.as_deref().unwrap_or_default());
        for (name, value) in &visitor.fields {
            if !message.is_empty() {
                message.push(' ');
            }
            let _ = write!(message, "{}={}", name, value);
        }

        let mut entry = LogEntry::new(severity, Some(tag), message);
        if let Some(trace) = visitor.error.take() {
            entry = entry.with_error_trace(trace);
        }

        self.logger.log_entry(&entry);
    }
}

/// Visitor that pulls the crashcatch fields out of an event.
#[derive(Default)]
struct CatchVisitor {
    message: Option<String>,
    tag: Option<String>,
    error: Option<String>,
    assert: bool,
    fields: Vec<(&'static str, String)>,
}

impl CatchVisitor {
    fn record_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "tag" => self.tag = Some(value),
            "error" => self.error = Some(value),
            name => self.fields.push((name, value)),
        }
    }
}

impl Visit for CatchVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_text(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "assert" {
            self.assert = value;
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_text(field, render_error(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::LoggerConfig;
    use crate::device::{AppContext, AppInfo};
    use crate::logging::entry::LogEntry;
    use crate::logging::logger::{DefaultSink, LogSink};
    use crate::logging::store::LogFileStore;
    use crate::test_support::CapturedConsole;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use tempfile::TempDir;
    use tracing_subscriber::prelude::*;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<LogEntry>>);

    impl LogSink for RecordingSink {
        fn emit(&self, entry: &LogEntry, _config: &LoggerConfig) {
            self.0.lock().push(entry.clone());
        }
    }

    fn logger_with(sink: Arc<RecordingSink>) -> (TempDir, Arc<LevelFilteredLogger>) {
        let temp = TempDir::new().unwrap();
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 1, 21)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ));
        let console = CapturedConsole::default();
        let context = AppContext::new(temp.path(), AppInfo::new("demo", "0.1.0"));
        let store = Arc::new(LogFileStore::new(&context, clock.clone(), console.sink()));
        let logger = Arc::new(LevelFilteredLogger::new(
            LoggerConfig::new(Severity::Verbose, Severity::Verbose),
            Arc::new(DefaultSink::new(console.sink(), store, clock)),
        ));
        logger.configure(
            LoggerConfig::new(Severity::Verbose, Severity::Verbose),
            Some(sink),
        );
        (temp, logger)
    }

    #[test]
    fn test_layer_maps_levels_tags_and_fields() {
        let sink = Arc::new(RecordingSink::default());
        let (_temp, logger) = logger_with(sink.clone());
        let subscriber = tracing_subscriber::registry().with(CatchLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!(tag = "Ui", "tap");
            tracing::warn!(target: "sync", count = 3, "slow peer");
            tracing::error!(tag = "Db", assert = true, "corrupt page");
        });

        let entries = sink.0.lock().clone();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].severity, Severity::Verbose);
        assert_eq!(entries[0].tag(), Some("Ui"));
        assert_eq!(entries[0].message, "tap");

        assert_eq!(entries[1].severity, Severity::Warn);
        assert_eq!(entries[1].tag(), Some("sync"));
        assert_eq!(entries[1].message, "slow peer count=3");

        assert_eq!(entries[2].severity, Severity::Assert);
        assert_eq!(entries[2].tag(), Some("Db"));
    }

    #[test]
    fn test_layer_attaches_error_field() {
        let sink = Arc::new(RecordingSink::default());
        let (_temp, logger) = logger_with(sink.clone());
        let subscriber = tracing_subscriber::registry().with(CatchLayer::new(logger));
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(tag = "Store", error = &err as &(dyn std::error::Error + 'static));
        });

        let entries = sink.0.lock().clone();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "disk full");
        assert_eq!(entries[0].error.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_layer_prefixes_span_scope() {
        let sink = Arc::new(RecordingSink::default());
        let (_temp, logger) = logger_with(sink.clone());
        let subscriber = tracing_subscriber::registry().with(CatchLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            let _outer = tracing::info_span!("sync").entered();
            let _inner = tracing::info_span!("upload").entered();
            tracing::info!(tag = "Sync", "chunk sent");
        });

        let entries = sink.0.lock().clone();
        assert_eq!(entries[0].message, "[sync > upload] chunk sent");
    }

    struct EchoingSink(Mutex<usize>);

    impl LogSink for EchoingSink {
        fn emit(&self, _entry: &LogEntry, _config: &LoggerConfig) {
            *self.0.lock() += 1;
            tracing::info!(tag = "Echo", "emitted from inside a sink");
        }
    }

    #[test]
    fn test_sink_emitting_events_does_not_recurse() {
        let (_temp, logger) = logger_with(Arc::new(RecordingSink::default()));
        let echo = Arc::new(EchoingSink(Mutex::new(0)));
        logger.configure(
            LoggerConfig::new(Severity::Verbose, Severity::Verbose),
            Some(echo.clone()),
        );
        let subscriber = tracing_subscriber::registry().with(CatchLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(tag = "Sync", "once");
        });

        assert_eq!(*echo.0.lock(), 1);
    }
}
