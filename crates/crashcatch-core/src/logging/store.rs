//! Daily append-only log files.
//!
//! One file per calendar day under `<files_dir>/exception/`. A file is
//! created on the first write of its day, receives the device header once,
//! and is only ever appended to afterwards, across restarts included.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use super::console::ConsoleSink;
use super::format;
use crate::clock::Clock;
use crate::device::AppContext;
use crate::error::CatchResult;

/// Tag used for the store's own console warnings.
const STORE_TAG: &str = "LogFileStore";

/// Resolves today's file and appends records to it.
pub struct LogFileStore {
    /// `<files_dir>/exception`
    log_dir: PathBuf,

    /// Header text, rendered once from the app context
    header: String,

    clock: Arc<dyn Clock>,

    console: ConsoleSink,

    /// Serializes resolve + open + write + close across threads
    write_lock: Mutex<()>,
}

impl LogFileStore {
    pub fn new(context: &AppContext, clock: Arc<dyn Clock>, console: ConsoleSink) -> Self {
        Self {
            log_dir: context.files_dir().join(format::LOG_SUBDIR),
            header: format::render_header(context.app(), context.device()),
            clock,
            console,
            write_lock: Mutex::new(()),
        }
    }

    /// Directory holding the daily files.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the file for `date`, whether or not it exists yet.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.log_dir.join(format::file_name(date))
    }

    /// Path of today's file, creating the directory and the file (with its
    /// header) if needed.
    ///
    /// Calling this again on the same day returns the same path and leaves
    /// the file untouched.
    pub fn resolve_today_file(&self) -> CatchResult<PathBuf> {
        self.resolve_file_for(self.clock.now().date())
    }

    fn resolve_file_for(&self, date: NaiveDate) -> CatchResult<PathBuf> {
        fs::create_dir_all(&self.log_dir)?;
        let path = self.path_for(date);

        // create_new: only the writer that actually creates the file writes the header
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => self.write_header(&mut file, &path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        Ok(path)
    }

    /// Write the header to a freshly created file.
    ///
    /// A failure is only reported: the file stays and records are still
    /// appended to it.
    fn write_header(&self, out: &mut impl Write, path: &Path) {
        if let Err(e) = out
            .write_all(self.header.as_bytes())
            .and_then(|_| out.flush())
        {
            self.console.warn(
                self.clock.now(),
                STORE_TAG,
                &format!("failed to write header to {}: {}", path.display(), e),
            );
        }
    }

    /// Append one record to the file of the record's own day.
    ///
    /// Returns the path written to. On failure the record is printed to the
    /// console instead and `None` is returned; nothing is raised.
    pub fn append(&self, tag: &str, message: &str, timestamp: NaiveDateTime) -> Option<PathBuf> {
        let record = format::render_record(tag, message, timestamp);

        let _guard = self.write_lock.lock();
        match self.write_record(&record, timestamp.date()) {
            Ok(path) => Some(path),
            Err(e) => {
                self.console.warn(
                    timestamp,
                    STORE_TAG,
                    &format!("failed to record log entry ({}):\n{}", e, record),
                );
                None
            }
        }
    }

    fn write_record(&self, record: &str, date: NaiveDate) -> CatchResult<PathBuf> {
        let path = self.resolve_file_for(date)?;
        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(record.as_bytes())?;
        file.flush()?;
        Ok(path)
    }

    /// Existing daily files, oldest first.
    pub fn list_files(&self) -> CatchResult<Vec<PathBuf>> {
        if !self.log_dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.log_dir)? {
            let path = entry?.path();
            if path.is_file() && format::date_of(&path).is_some() {
                files.push(path);
            }
        }

        // ISO dates sort chronologically
        files.sort();
        Ok(files)
    }
}

impl std::fmt::Debug for LogFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFileStore")
            .field("log_dir", &self.log_dir)
            .finish_non_exhaustive()
    }
}
