//! Last-resort handling of uncaught faults (panics).
//!
//! [`FaultHandler::install`] takes the current panic hook as the previous
//! link of the chain and puts itself in front of it. On every panic the
//! fault is logged first, then either forwarded to the previous hook or,
//! when the chain was detached, the process is terminated.
//!
//! ```text
//! panic ──► FaultHandler ──log──► LevelFilteredLogger ──► console / daily file
//!                │
//!                ├── previous hook present ──► previous hook (runtime default prints, thread unwinds)
//!                └── detached or refused ───► Terminator (process exit)
//! ```
//!
//! Rust always has a panic hook installed (the runtime default), so the
//! captured hook is never absent on its own; [`FaultHandler::detach_previous`]
//! models a chain without a previous handler.

use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::{CatchError, CatchResult};
use crate::logging::{LevelFilteredLogger, LogEntry};
use crate::severity::Severity;

/// Tag of every entry logged by the fault handler.
pub const FAULT_TAG: &str = "GlobalFault";

/// Exit status used when a fault terminates the process directly
/// (`EX_SOFTWARE`, internal software error).
pub const TERMINATION_EXIT_CODE: i32 = 70;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// A panic hook as stored by `std::panic`.
pub type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Thread a fault happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub name: Option<String>,
    pub id: String,
}

impl ThreadInfo {
    pub fn current() -> Self {
        let thread = thread::current();
        Self {
            name: thread.name().map(str::to_owned),
            id: format!("{:?}", thread.id()),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Owned description of a panic.
#[derive(Debug, Clone)]
pub struct PanicFault {
    message: String,
    location: Option<String>,
    backtrace: Option<String>,
}

impl PanicFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            backtrace: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Capture payload, location and a backtrace from a live panic.
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let mut fault = Self::new(payload_message(info.payload()));
        if let Some(location) = info.location() {
            fault = fault.with_location(format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ));
        }
        fault.backtrace = Some(Backtrace::force_capture().to_string());
        fault
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Display text followed by the backtrace, if one was captured.
    pub fn trace(&self) -> String {
        match &self.backtrace {
            Some(backtrace) => format!("{}\nstack backtrace:\n{}", self, backtrace),
            None => self.to_string(),
        }
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

impl fmt::Display for PanicFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}", self.message, location),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for PanicFault {}

/// One uncaught fault as seen by the chain.
pub struct Uncaught<'a> {
    thread: ThreadInfo,
    fault: PanicFault,
    info: Option<&'a PanicHookInfo<'a>>,
}

impl<'a> Uncaught<'a> {
    /// A fault raised outside the panic machinery (tests, embedders).
    pub fn new(thread: ThreadInfo, fault: PanicFault) -> Self {
        Self {
            thread,
            fault,
            info: None,
        }
    }

    fn from_hook(info: &'a PanicHookInfo<'a>) -> Self {
        Self {
            thread: ThreadInfo::current(),
            fault: PanicFault::from_panic(info),
            info: Some(info),
        }
    }

    pub fn thread(&self) -> &ThreadInfo {
        &self.thread
    }

    pub fn fault(&self) -> &PanicFault {
        &self.fault
    }

    /// The runtime's panic info, when the fault came from a real panic.
    pub fn panic_info(&self) -> Option<&'a PanicHookInfo<'a>> {
        self.info
    }
}

/// A link in the fault chain.
pub trait UncaughtHandler: Send + Sync {
    /// Take over the fault. Returns `false` when this link cannot handle it,
    /// in which case the process is terminated.
    fn uncaught(&self, uncaught: &Uncaught<'_>) -> bool;
}

/// The panic hook that was installed before ours.
pub struct PreviousHook(PanicHook);

impl PreviousHook {
    pub fn new(hook: PanicHook) -> Self {
        Self(hook)
    }
}

impl UncaughtHandler for PreviousHook {
    fn uncaught(&self, uncaught: &Uncaught<'_>) -> bool {
        // A std hook can only be called with a real PanicHookInfo
        match uncaught.panic_info() {
            Some(info) => {
                (self.0)(info);
                true
            }
            None => false,
        }
    }
}

/// Terminal action when no previous handler exists.
pub trait Terminator: Send + Sync {
    fn terminate(&self, uncaught: &Uncaught<'_>);
}

/// Exits the process with [`TERMINATION_EXIT_CODE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, _uncaught: &Uncaught<'_>) {
        std::process::exit(TERMINATION_EXIT_CODE);
    }
}

/// Logs uncaught faults and hands them down the chain.
pub struct FaultHandler {
    logger: Arc<LevelFilteredLogger>,
    previous: Option<Box<dyn UncaughtHandler>>,
    terminator: Box<dyn Terminator>,
    chain_previous: bool,
}

impl FaultHandler {
    pub fn new(logger: Arc<LevelFilteredLogger>) -> Self {
        Self {
            logger,
            previous: None,
            terminator: Box::new(ProcessTerminator),
            chain_previous: true,
        }
    }

    /// Use `previous` as the next link instead of the captured panic hook.
    pub fn with_previous(mut self, previous: impl UncaughtHandler + 'static) -> Self {
        self.previous = Some(Box::new(previous));
        self.chain_previous = true;
        self
    }

    pub fn with_terminator(self, terminator: impl Terminator + 'static) -> Self {
        self.with_boxed_terminator(Box::new(terminator))
    }

    pub fn with_boxed_terminator(mut self, terminator: Box<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Run without a previous handler: faults terminate the process.
    pub fn detach_previous(mut self) -> Self {
        self.previous = None;
        self.chain_previous = false;
        self
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Become the process-wide panic hook.
    ///
    /// The current hook is captured as the previous link unless one was
    /// given explicitly or the chain is detached. Only one handler can be
    /// installed per process; later calls fail with
    /// [`CatchError::AlreadyInstalled`] and change nothing, so the handler
    /// can never capture itself.
    pub fn install(mut self) -> CatchResult<Arc<Self>> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CatchError::AlreadyInstalled);
        }

        let current = panic::take_hook();
        if self.chain_previous && self.previous.is_none() {
            self.previous = Some(Box::new(PreviousHook::new(current)));
        }

        let handler = Arc::new(self);
        let hook_handler = handler.clone();
        panic::set_hook(Box::new(move |info| {
            hook_handler.on_uncaught(&Uncaught::from_hook(info));
        }));

        Ok(handler)
    }

    /// Record an error the caller already handled. Nothing else happens.
    pub fn report(&self, error: &(dyn Error + 'static)) {
        self.logger.log_error(Severity::Error, FAULT_TAG, error);
    }

    /// Log the fault, then forward it or terminate.
    ///
    /// A fault the previous link refuses (e.g. one built with
    /// [`Uncaught::new`] reaching a std hook) terminates the process too.
    pub fn on_uncaught(&self, uncaught: &Uncaught<'_>) {
        let entry = LogEntry::new(
            Severity::Error,
            Some(FAULT_TAG.to_string()),
            format!(
                "Uncaught fault in thread '{}'",
                uncaught.thread().display_name()
            ),
        )
        .with_error_trace(uncaught.fault().trace());
        self.logger.log_entry(&entry);

        let forwarded = match &self.previous {
            Some(previous) => previous.uncaught(uncaught),
            None => false,
        };
        if !forwarded {
            self.terminator.terminate(uncaught);
        }
    }
}

/// Whether a fault handler has been installed in this process.
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}
