//! The single funnel every log entry passes through.

use std::error::Error;
use std::sync::Arc;

use parking_lot::RwLock;

use super::console::ConsoleSink;
use super::entry::LogEntry;
use super::store::LogFileStore;
use crate::clock::Clock;
use crate::config::LoggerConfig;
use crate::severity::Severity;

/// Destination for prepared log entries.
///
/// The sink decides what to do with an entry given the current thresholds.
/// Implementations must not panic: the logger is also called from inside
/// the panic hook.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: &LogEntry, config: &LoggerConfig);
}

/// Print when the entry reaches the print threshold, then persist when it
/// reaches the output threshold and has both a tag and a message.
pub struct DefaultSink {
    console: ConsoleSink,
    store: Arc<LogFileStore>,
    clock: Arc<dyn Clock>,
}

impl DefaultSink {
    pub fn new(console: ConsoleSink, store: Arc<LogFileStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            console,
            store,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<LogFileStore> {
        &self.store
    }
}

impl LogSink for DefaultSink {
    fn emit(&self, entry: &LogEntry, config: &LoggerConfig) {
        let now = self.clock.now();

        if config.should_print(entry.severity) {
            self.console
                .print(now, entry.severity, entry.tag(), &entry.message);
        }

        if config.should_persist(entry.severity) && entry.is_persistable() {
            if let Some(tag) = entry.tag() {
                // Failures are already reported on the console by the store
                let _ = self.store.append(tag, &entry.message, now);
            }
        }
    }
}

struct LoggerState {
    config: LoggerConfig,
    sink: Arc<dyn LogSink>,
}

/// Level-filtered logger with a replaceable sink.
///
/// Configuration and sink are swapped together under one lock; each log
/// call takes a snapshot of both and emits outside the lock.
pub struct LevelFilteredLogger {
    state: RwLock<LoggerState>,
    default_sink: Arc<DefaultSink>,
}

impl LevelFilteredLogger {
    pub fn new(config: LoggerConfig, default_sink: Arc<DefaultSink>) -> Self {
        Self {
            state: RwLock::new(LoggerState {
                config,
                sink: default_sink.clone(),
            }),
            default_sink,
        }
    }

    /// Replace thresholds and sink. `None` reinstalls the default sink.
    ///
    /// The last call wins.
    pub fn configure(&self, config: LoggerConfig, sink: Option<Arc<dyn LogSink>>) {
        let sink = sink.unwrap_or_else(|| self.default_sink.clone() as Arc<dyn LogSink>);
        let mut state = self.state.write();
        state.config = config;
        state.sink = sink;
    }

    pub fn config(&self) -> LoggerConfig {
        self.state.read().config
    }

    /// File store behind the default sink.
    pub fn store(&self) -> &Arc<LogFileStore> {
        self.default_sink.store()
    }

    /// Log a message with an optional attached error.
    pub fn log(
        &self,
        severity: Severity,
        tag: Option<&str>,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
    ) {
        let mut entry = LogEntry::new(severity, tag.map(str::to_owned), message);
        if let Some(error) = error {
            entry = entry.with_error(error);
        }
        self.log_entry(&entry);
    }

    /// Hand a prepared entry to the current sink.
    pub fn log_entry(&self, entry: &LogEntry) {
        let (config, sink) = {
            let state = self.state.read();
            (state.config, state.sink.clone())
        };
        sink.emit(entry, &config);
    }

    pub fn verbose(&self, tag: &str, message: &str) {
        self.log(Severity::Verbose, Some(tag), message, None);
    }

    pub fn debug(&self, tag: &str, message: &str) {
        self.log(Severity::Debug, Some(tag), message, None);
    }

    pub fn info(&self, tag: &str, message: &str) {
        self.log(Severity::Info, Some(tag), message, None);
    }

    pub fn warn(&self, tag: &str, message: &str) {
        self.log(Severity::Warn, Some(tag), message, None);
    }

    pub fn error(&self, tag: &str, message: &str) {
        self.log(Severity::Error, Some(tag), message, None);
    }

    /// What a Terrible Failure: logged at `Assert`.
    pub fn wtf(&self, tag: &str, message: &str) {
        self.log(Severity::Assert, Some(tag), message, None);
    }

    /// Log an error on its own; the rendered trace becomes the message.
    pub fn log_error(&self, severity: Severity, tag: &str, error: &(dyn Error + 'static)) {
        self.log(severity, Some(tag), "", Some(error));
    }
}
