//! Panic hook chaining against the real `std::panic` machinery.
//!
//! Installing a fault handler is process-wide and one-shot, so this file
//! holds a single test that walks the whole lifecycle.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use crashcatch_core::{
    AppContext, AppInfo, CatchError, ConsoleSink, CrashCatch, LoggerConfig, Severity, FAULT_TAG,
};
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct HookCall {
    thread: Option<String>,
    message: String,
    already_logged: bool,
}

fn payload_text(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_default()
}

fn any_log_contains(log_dir: &Path, needle: &str) -> bool {
    fs::read_dir(log_dir)
        .into_iter()
        .flatten()
        .flatten()
        .any(|entry| {
            fs::read_to_string(entry.path())
                .map(|content| content.contains(needle))
                .unwrap_or(false)
        })
}

#[test]
fn test_fault_is_logged_then_forwarded_to_previous_hook() {
    let temp = TempDir::new().unwrap();
    let log_dir = temp.path().join("exception");

    // The pre-existing handler
    let calls: Arc<Mutex<Vec<HookCall>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    let watched = log_dir.clone();
    std::panic::set_hook(Box::new(move |info| {
        let message = payload_text(info.payload());
        let already_logged = any_log_contains(&watched, &message);
        seen.lock().unwrap().push(HookCall {
            thread: thread::current().name().map(str::to_owned),
            message,
            already_logged,
        });
    }));

    let app = AppContext::new(temp.path(), AppInfo::new("fault-chain", "0.1.0"));
    let catch = CrashCatch::builder(app)
        .config(LoggerConfig::new(Severity::Assert, Severity::Error))
        .console(ConsoleSink::new(std::io::sink))
        .install_subscriber(false)
        .init()
        .expect("first install succeeds");
    assert!(catch.fault_handler().has_previous());

    let result = thread::Builder::new()
        .name("worker".into())
        .spawn(|| panic!("worker exploded"))
        .unwrap()
        .join();
    assert!(result.is_err(), "the faulting thread still dies");

    {
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "previous hook runs exactly once");
        assert_eq!(calls[0].thread.as_deref(), Some("worker"));
        assert_eq!(calls[0].message, "worker exploded");
        assert!(calls[0].already_logged, "fault is logged before forwarding");
    }

    let content = fs::read_to_string(catch.today_file().unwrap()).unwrap();
    assert!(content.contains(&format!(
        "\t{FAULT_TAG}\nUncaught fault in thread 'worker'\nworker exploded at "
    )));
    assert!(content.contains("stack backtrace:"));

    // A second install must not capture the first handler as its own previous
    let again = CrashCatch::builder(AppContext::new(temp.path(), AppInfo::new("again", "0.0.0")))
        .console(ConsoleSink::new(std::io::sink))
        .install_subscriber(false)
        .init();
    assert!(matches!(again, Err(CatchError::AlreadyInstalled)));

    let _ = thread::spawn(|| panic!("second fault")).join();
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2, "chain unchanged by the refused install");
    assert_eq!(calls[1].message, "second fault");
    assert!(calls[1].already_logged);
}
