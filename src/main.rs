//! Crashcatch demo
//!
//! Initializes crash capture, then raises one sample fault so the capture
//! paths can be exercised end to end.
//!
//! ## Usage
//!
//! ```bash
//! # Log a tagged debug event through tracing
//! crashcatch-demo tap
//!
//! # Uncaught I/O failure (logged, then the default panic hook runs)
//! crashcatch-demo io
//!
//! # Uncaught fault with no previous handler (logged, then exit 70)
//! crashcatch-demo --no-chain missing
//!
//! # Error caught by the application and reported
//! crashcatch-demo caught
//!
//! # Where today's log lives, and which daily files exist
//! crashcatch-demo path
//! crashcatch-demo files
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crashcatch_core::{AppContext, AppInfo, CatchContext, CrashCatch, LoggerConfig, Severity};

const APP_NAME: &str = "crashcatch-demo";

/// Crashcatch demo - panic capture with daily log files
#[derive(Parser)]
#[command(name = "crashcatch-demo")]
#[command(version)]
#[command(about = "Crashcatch demo - panic capture with daily log files")]
struct Cli {
    /// Base directory for logs (default: per-user data dir)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Minimum severity echoed to stderr
    #[arg(long, global = true, default_value = "verbose")]
    print_level: Severity,

    /// Minimum severity written to the daily file
    #[arg(long, global = true, default_value = "verbose")]
    output_level: Severity,

    /// JSON file with `print_threshold` and `output_threshold` (overrides the level flags)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Drop the existing panic hook; uncaught faults terminate the process
    #[arg(long, global = true)]
    no_chain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit a debug event tagged "TestButton"
    Tap,

    /// Fail reading a file that does not exist, without handling it
    Io,

    /// Look up a value that is not there, without handling it
    Missing,

    /// Fail parsing a number, handle it and report it
    Caught,

    /// Print today's log file path
    Path,

    /// List existing daily log files
    Files,
}

fn load_config(cli: &Cli) -> Result<LoggerConfig> {
    match &cli.config {
        Some(path) => LoggerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(LoggerConfig::new(cli.print_level, cli.output_level)),
    }
}

fn setup(cli: &Cli) -> Result<CatchContext> {
    let files_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| AppContext::default_files_dir(APP_NAME));
    let app = AppContext::new(
        files_dir,
        AppInfo::new(APP_NAME, env!("CARGO_PKG_VERSION")),
    );

    CrashCatch::builder(app)
        .config(load_config(cli)?)
        .chain_previous(!cli.no_chain)
        .init()
        .context("Failed to initialize crash capture")
}

/// Settings the demo pretends to need; always empty.
fn lookup_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings.get(key).map(String::as_str)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let catch = setup(&cli)?;

    match cli.command {
        Commands::Tap => {
            tracing::debug!(tag = "TestButton", "test button tapped");
            println!("Logged tap");
        }

        Commands::Io => {
            let path = catch.app().files_dir().join("missing").join("settings.cfg");
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => panic!("IOException: {} ({})", e, path.display()),
            };
            println!("{}", contents);
        }

        Commands::Missing => {
            let settings = HashMap::new();
            let Some(name) = lookup_setting(&settings, "user.name") else {
                panic!("missing value: no setting named 'user.name'");
            };
            println!("{}", name);
        }

        Commands::Caught => match "12a".parse::<u32>() {
            Ok(n) => println!("Parsed {}", n),
            Err(e) => {
                catch.report(&e);
                println!("Reported: {}", e);
            }
        },

        Commands::Path => {
            let path = catch.today_file()?;
            println!("{}", path.display());
        }

        Commands::Files => {
            let files = catch.store().list_files()?;
            if files.is_empty() {
                println!("No log files yet");
            }
            for file in files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}
