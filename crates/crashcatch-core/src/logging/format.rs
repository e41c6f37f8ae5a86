//! On-disk text format of the daily log file.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::device::{AppInfo, DeviceInfo};

/// Line closing the header and every record.
pub const SEPARATOR: &str = "--------------------------------------------------------";

/// Prefix of every record's first line.
pub const RECORD_MARKER: &str = "[CATCH]";

pub const DAY_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const LOG_SUBDIR: &str = "exception";
pub const FILE_PREFIX: &str = "log-";
pub const FILE_SUFFIX: &str = ".txt";

const TRAILER: &str = "\n\n\n\n";

/// `log-<YYYY-MM-DD>.txt`
pub fn file_name(date: NaiveDate) -> String {
    format!("{}{}{}", FILE_PREFIX, date.format(DAY_FORMAT), FILE_SUFFIX)
}

/// Parse the date back out of a daily file name.
pub fn date_of(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let day = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(day, DAY_FORMAT).ok()
}

/// One record: marker, timestamp, tag, message, separator, blank lines.
pub fn render_record(tag: &str, message: &str, timestamp: NaiveDateTime) -> String {
    let mut record = String::with_capacity(
        RECORD_MARKER.len() + 20 + tag.len() + message.len() + SEPARATOR.len() + 8,
    );
    record.push_str(RECORD_MARKER);
    record.push_str(&timestamp.format(TIME_FORMAT).to_string());
    record.push('\t');
    record.push_str(tag);
    record.push('\n');
    record.push_str(message);
    record.push('\n');
    record.push_str(SEPARATOR);
    record.push_str(TRAILER);
    record
}

/// Header written once at the top of each new daily file.
pub fn render_header(app: &AppInfo, device: &DeviceInfo) -> String {
    let mut header = String::new();
    header.push_str(SEPARATOR);
    header.push('\n');
    header.push_str(&format!("App Version: {}\n", app.version_label()));
    header.push_str(&format!("OS Version: {}-{}\n", device.os, device.os_version));
    header.push_str(&format!("Vendor: {}\n", device.manufacturer));
    header.push_str(&format!("Model: {}\n", device.model));
    header.push_str(&format!("CPU: [{}]\n", device.cpu_archs.join(", ")));
    header.push_str(SEPARATOR);
    header.push_str(TRAILER);
    header
}
