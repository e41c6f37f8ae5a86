//! Error types for Crashcatch

use thiserror::Error;

/// Main error type for Crashcatch operations
///
/// Only setup paths surface these. Logging itself never returns an error;
/// persistence failures are reported on the console sink instead.
#[derive(Error, Debug)]
pub enum CatchError {
    /// Creating or writing a log file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A fault handler was already installed in this process
    #[error("Fault handler is already installed")]
    AlreadyInstalled,

    /// A severity name could not be parsed
    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),

    /// Logger configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using CatchError
pub type CatchResult<T> = Result<T, CatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatchError::InvalidSeverity("loud".to_string());
        assert_eq!(format!("{}", err), "Invalid severity: loud");
        assert_eq!(
            CatchError::AlreadyInstalled.to_string(),
            "Fault handler is already installed"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CatchError = io_err.into();
        assert!(matches!(err, CatchError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
