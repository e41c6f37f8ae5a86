//! Property tests for threshold gating of both sinks.

use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use crashcatch_core::{
    AppContext, AppInfo, Clock, ConsoleSink, DefaultSink, LevelFilteredLogger, LogFileStore,
    LoggerConfig, ManualClock, Severity,
};
use proptest::prelude::*;
use tempfile::TempDir;

#[derive(Clone)]
struct TestWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Harness {
    temp: TempDir,
    logger: LevelFilteredLogger,
    console: Arc<Mutex<Vec<u8>>>,
}

impl Harness {
    fn new(config: LoggerConfig) -> Self {
        let temp = TempDir::new().unwrap();
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer = buf.clone();
        let console = ConsoleSink::new(move || TestWriter(writer.clone()));
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 5, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        ));
        let app = AppContext::new(temp.path(), AppInfo::new("gating", "0.1.0"));
        let store = Arc::new(LogFileStore::new(&app, clock.clone(), console.clone()));
        let logger = LevelFilteredLogger::new(
            config,
            Arc::new(DefaultSink::new(console, store, clock)),
        );
        Self {
            temp,
            logger,
            console: buf,
        }
    }

    fn console(&self) -> String {
        String::from_utf8(self.console.lock().unwrap().clone()).unwrap()
    }

    fn records(&self) -> usize {
        let path = self
            .temp
            .path()
            .join("exception")
            .join("log-2026-05-01.txt");
        fs::read_to_string(path)
            .map(|content| content.matches("[CATCH]").count())
            .unwrap_or(0)
    }
}

fn severity() -> impl Strategy<Value = Severity> {
    prop::sample::select(Severity::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn console_prints_exactly_at_or_above_threshold(
        threshold in severity(),
        level in severity(),
    ) {
        let harness = Harness::new(LoggerConfig::new(threshold, Severity::Assert));
        harness.logger.log(level, Some("Gate"), "probe", None);

        let printed = harness.console().contains("/Gate: probe");
        prop_assert_eq!(printed, level >= threshold);
    }

    #[test]
    fn file_gains_one_record_at_or_above_threshold(
        threshold in severity(),
        level in severity(),
    ) {
        let harness = Harness::new(LoggerConfig::new(Severity::Assert, threshold));
        harness.logger.log(level, Some("Gate"), "first", None);
        harness.logger.log(level, Some("Gate"), "second", None);

        let expected = if level >= threshold { 2 } else { 0 };
        prop_assert_eq!(harness.records(), expected);
    }

    #[test]
    fn empty_tag_or_message_never_persisted(
        level in severity(),
        blank_tag in any::<bool>(),
    ) {
        let harness = Harness::new(LoggerConfig::new(Severity::Assert, Severity::Verbose));
        if blank_tag {
            harness.logger.log(level, Some(""), "message", None);
        } else {
            harness.logger.log(level, Some("Gate"), "", None);
        }
        prop_assert_eq!(harness.records(), 0);
    }
}
