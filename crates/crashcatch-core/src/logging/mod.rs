//! Level-filtered logging with a daily plain-text file sink.
//!
//! Every entry goes through [`LevelFilteredLogger`], which hands it to the
//! installed [`LogSink`]. The default sink prints to the console when the
//! entry reaches the print threshold and appends it to today's file when it
//! reaches the output threshold.
//!
//! ## Layout
//!
//! ```text
//! <files_dir>/
//! └── exception/
//!     ├── log-2026-01-21.txt      # header once, then one record per entry
//!     └── log-2026-01-22.txt
//! ```
//!
//! ## Record format
//!
//! ```text
//! [CATCH]2026-01-21 14:30:45	GlobalFault
//! Uncaught fault in thread 'worker'
//! boom at src/main.rs:10:5
//! --------------------------------------------------------
//!
//!
//!
//! ```
//!
//! ## Intercepting tracing events
//!
//! ```ignore
//! use crashcatch_core::logging::CatchLayer;
//! use tracing_subscriber::prelude::*;
//!
//! let subscriber = tracing_subscriber::registry().with(CatchLayer::new(logger));
//! tracing::subscriber::set_global_default(subscriber)?;
//!
//! tracing::info!(tag = "Sync", "connected");
//! ```

pub mod console;
pub mod entry;
pub mod format;
pub mod layer;
pub mod logger;
pub mod store;

// Re-exports for convenience
pub use console::ConsoleSink;
pub use entry::{render_error, LogEntry};
pub use layer::CatchLayer;
pub use logger::{DefaultSink, LevelFilteredLogger, LogSink};
pub use store::LogFileStore;
