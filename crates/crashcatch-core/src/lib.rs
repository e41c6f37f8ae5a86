//! Crashcatch Core Library
//!
//! Panic capture and level-filtered daily file logging for a single process.
//!
//! ## Overview
//!
//! Crashcatch installs a last-resort panic hook, intercepts every `tracing`
//! event emitted in the process, and persists the interesting ones to a
//! plain-text file per calendar day for later diagnosis.
//!
//! - **Console sink**: entries at or above the print threshold are echoed
//!   to stderr (or any writer you plug in)
//! - **File sink**: entries at or above the output threshold, with a tag and
//!   a message, are appended to `<files_dir>/exception/log-<YYYY-MM-DD>.txt`
//! - **Fault handler**: panics are logged, then handed to the previously
//!   installed hook (or the process is terminated)
//!
//! ## Quick Start
//!
//! ```ignore
//! use crashcatch_core::{AppContext, AppInfo, CrashCatch, Severity};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = AppContext::new(
//!         AppContext::default_files_dir("my-app"),
//!         AppInfo::new("my-app", env!("CARGO_PKG_VERSION")),
//!     );
//!     let catch = CrashCatch::init(app, Severity::Verbose, Severity::Warn)?;
//!
//!     tracing::warn!(tag = "Sync", "peer went away");
//!
//!     if let Err(err) = std::fs::read("missing.cfg") {
//!         catch.report(&err);
//!     }
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod fault;
pub mod logging;
pub mod severity;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LoggerConfig;
pub use context::{CatchBuilder, CatchContext, CrashCatch};
pub use device::{AppContext, AppInfo, DeviceInfo};
pub use error::{CatchError, CatchResult};
pub use fault::{
    FaultHandler, PanicFault, PanicHook, PreviousHook, ProcessTerminator, Terminator, ThreadInfo,
    Uncaught, UncaughtHandler, FAULT_TAG, TERMINATION_EXIT_CODE,
};
pub use logging::{
    CatchLayer, ConsoleSink, DefaultSink, LevelFilteredLogger, LogEntry, LogFileStore, LogSink,
};
pub use severity::Severity;
