//! Application and host description written into each new log file.

use std::fs;
use std::path::{Path, PathBuf};

const UNKNOWN: &str = "unknown";

/// Identity of the running application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    /// Build number, when the packaging exposes one
    pub build: Option<String>,
}

impl AppInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build: None,
        }
    }

    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// `<build>-<version>`, or just the version without a build number.
    pub fn version_label(&self) -> String {
        match &self.build {
            Some(build) => format!("{}-{}", build, self.version),
            None => self.version.clone(),
        }
    }
}

/// Host the process runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub os: String,
    pub os_version: String,
    pub manufacturer: String,
    pub model: String,
    pub cpu_archs: Vec<String>,
}

impl DeviceInfo {
    /// Best-effort probe of the current host.
    ///
    /// Linux exposes vendor and model through DMI; elsewhere those fields
    /// stay `unknown`.
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            os_version: os_release_name()
                .or_else(|| read_trimmed("/proc/sys/kernel/osrelease"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            manufacturer: read_trimmed("/sys/class/dmi/id/sys_vendor")
                .unwrap_or_else(|| UNKNOWN.to_string()),
            model: read_trimmed("/sys/class/dmi/id/product_name")
                .unwrap_or_else(|| UNKNOWN.to_string()),
            cpu_archs: vec![std::env::consts::ARCH.to_string()],
        }
    }
}

fn read_trimmed(path: impl AsRef<Path>) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn os_release_name() -> Option<String> {
    let content = fs::read_to_string("/etc/os-release").ok()?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Everything the core needs to know about its host application.
#[derive(Debug, Clone)]
pub struct AppContext {
    files_dir: PathBuf,
    app: AppInfo,
    device: DeviceInfo,
}

impl AppContext {
    /// Context rooted at `files_dir`; logs go to `files_dir/exception/`.
    pub fn new(files_dir: impl Into<PathBuf>, app: AppInfo) -> Self {
        Self {
            files_dir: files_dir.into(),
            app,
            device: DeviceInfo::detect(),
        }
    }

    /// Replace the probed device description.
    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Per-user data directory for `app_name` (e.g. `~/.local/share/<app_name>`).
    pub fn default_files_dir(app_name: &str) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(app_name)
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    pub fn app(&self) -> &AppInfo {
        &self.app
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }
}
