//! Ordered log severities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatchError;

/// Importance of a log entry.
///
/// Variants are declared in ascending order, so the derived `Ord` is the
/// ranking used by both thresholds: `Verbose < Debug < Info < Warn < Error < Assert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "trace")]
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Assert,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 6] = [
        Severity::Verbose,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Assert,
    ];

    /// Lowercase name, as accepted by `FromStr` and serde.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Verbose => "verbose",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Assert => "assert",
        }
    }

    /// One-letter code used in console lines (`E/Tag: ...`).
    pub fn code(&self) -> char {
        match self {
            Severity::Verbose => 'V',
            Severity::Debug => 'D',
            Severity::Info => 'I',
            Severity::Warn => 'W',
            Severity::Error => 'E',
            Severity::Assert => 'A',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verbose" | "trace" | "v" => Ok(Severity::Verbose),
            "debug" | "d" => Ok(Severity::Debug),
            "info" | "i" => Ok(Severity::Info),
            "warn" | "warning" | "w" => Ok(Severity::Warn),
            "error" | "e" => Ok(Severity::Error),
            "assert" | "a" => Ok(Severity::Assert),
            _ => Err(CatchError::InvalidSeverity(s.to_string())),
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Severity::Error
        } else if level == tracing::Level::WARN {
            Severity::Warn
        } else if level == tracing::Level::INFO {
            Severity::Info
        } else if level == tracing::Level::DEBUG {
            Severity::Debug
        } else {
            Severity::Verbose
        }
    }
}
