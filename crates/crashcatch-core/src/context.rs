//! Init entry point and the context object it hands back.
//!
//! All process-wide state (thresholds, sink, file store, fault handler) is
//! built by one explicit init call and owned by the returned
//! [`CatchContext`]. The only global side effects are the tracing subscriber
//! and the panic hook, both installed at init.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::prelude::*;

use crate::clock::{Clock, SystemClock};
use crate::config::LoggerConfig;
use crate::device::AppContext;
use crate::error::CatchResult;
use crate::fault::{FaultHandler, Terminator};
use crate::logging::{
    CatchLayer, ConsoleSink, DefaultSink, LevelFilteredLogger, LogFileStore, LogSink,
};
use crate::severity::Severity;

/// Entry points.
pub struct CrashCatch;

impl CrashCatch {
    /// Configure the logger, intercept tracing output and install the fault
    /// handler, chained to whatever panic hook is currently set.
    ///
    /// Call once, early in `main`, before anything else logs.
    pub fn init(
        app: AppContext,
        print_threshold: Severity,
        output_threshold: Severity,
    ) -> CatchResult<CatchContext> {
        Self::builder(app)
            .config(LoggerConfig::new(print_threshold, output_threshold))
            .init()
    }

    pub fn builder(app: AppContext) -> CatchBuilder {
        CatchBuilder::new(app)
    }
}

/// Optional knobs for init.
pub struct CatchBuilder {
    app: AppContext,
    config: LoggerConfig,
    sink: Option<Arc<dyn LogSink>>,
    clock: Arc<dyn Clock>,
    console: ConsoleSink,
    terminator: Option<Box<dyn Terminator>>,
    chain_previous: bool,
    install_subscriber: bool,
}

impl CatchBuilder {
    pub fn new(app: AppContext) -> Self {
        Self {
            app,
            config: LoggerConfig::default(),
            sink: None,
            clock: Arc::new(SystemClock),
            console: ConsoleSink::stderr(),
            terminator: None,
            chain_previous: true,
            install_subscriber: true,
        }
    }

    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default print-then-persist sink.
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn console(mut self, console: ConsoleSink) -> Self {
        self.console = console;
        self
    }

    pub fn terminator(mut self, terminator: impl Terminator + 'static) -> Self {
        self.terminator = Some(Box::new(terminator));
        self
    }

    /// `false` drops the panic hook found at init: faults then terminate the
    /// process right after being logged.
    pub fn chain_previous(mut self, chain: bool) -> Self {
        self.chain_previous = chain;
        self
    }

    /// `false` skips setting the global tracing subscriber; compose
    /// [`CatchContext::layer`] into your own subscriber instead.
    pub fn install_subscriber(mut self, install: bool) -> Self {
        self.install_subscriber = install;
        self
    }

    /// Build everything, install the tracing subscriber and the fault handler.
    pub fn init(self) -> CatchResult<CatchContext> {
        let store = Arc::new(LogFileStore::new(
            &self.app,
            self.clock.clone(),
            self.console.clone(),
        ));
        let default_sink = Arc::new(DefaultSink::new(
            self.console.clone(),
            store.clone(),
            self.clock.clone(),
        ));
        let logger = Arc::new(LevelFilteredLogger::new(self.config, default_sink));
        logger.configure(self.config, self.sink);

        if self.install_subscriber {
            let subscriber = tracing_subscriber::registry().with(CatchLayer::new(logger.clone()));
            if let Err(e) = subscriber.try_init() {
                // Another subscriber owns the process; direct logger calls still work
                self.console.warn(
                    self.clock.now(),
                    "CrashCatch",
                    &format!("tracing output not intercepted: {}", e),
                );
            }
        }

        let mut faults = FaultHandler::new(logger.clone());
        if let Some(terminator) = self.terminator {
            faults = faults.with_boxed_terminator(terminator);
        }
        if !self.chain_previous {
            faults = faults.detach_previous();
        }
        let faults = faults.install()?;

        Ok(CatchContext {
            app: self.app,
            store,
            logger,
            faults,
        })
    }
}

/// Handle to the initialized core.
pub struct CatchContext {
    app: AppContext,
    store: Arc<LogFileStore>,
    logger: Arc<LevelFilteredLogger>,
    faults: Arc<FaultHandler>,
}

impl CatchContext {
    pub fn app(&self) -> &AppContext {
        &self.app
    }

    pub fn logger(&self) -> &Arc<LevelFilteredLogger> {
        &self.logger
    }

    pub fn store(&self) -> &Arc<LogFileStore> {
        &self.store
    }

    pub fn fault_handler(&self) -> &Arc<FaultHandler> {
        &self.faults
    }

    /// Layer to add to an application-owned subscriber.
    pub fn layer(&self) -> CatchLayer {
        CatchLayer::new(self.logger.clone())
    }

    /// Record an error that was caught and not re-raised.
    pub fn report(&self, error: &(dyn Error + 'static)) {
        self.faults.report(error);
    }

    /// Today's log file, created with its header if needed.
    pub fn today_file(&self) -> CatchResult<PathBuf> {
        self.store.resolve_today_file()
    }

    /// Replace thresholds and sink after init; `None` restores the default sink.
    pub fn reconfigure(&self, config: LoggerConfig, sink: Option<Arc<dyn LogSink>>) {
        self.logger.configure(config, sink);
    }
}
