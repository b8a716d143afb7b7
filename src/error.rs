//! Custom error types for the application.
//!
//! This module defines the primary error type, `PanelError`, used across the
//! configuration and discovery subsystems. Using the `thiserror` crate, it
//! provides a centralized way to handle the recoverable conditions the core
//! surfaces to its callers: missing or malformed project files, structural
//! validation failures, save attempts with no destination, and serial port
//! availability problems.
//!
//! Load/save operations return these as ordinary `Result` values rather than
//! aborting; the invoking layer decides how to present them. Discovery-cycle
//! failures are logged and never propagate out of the scheduler.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, PanelError>;

/// Errors surfaced by the configuration store and discovery service.
#[derive(Error, Debug)]
pub enum PanelError {
    /// The requested project file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The file exists but could not be deserialized into a project.
    #[error("Invalid project file: {0}")]
    Parse(String),

    /// A structural invariant of the configuration is violated.
    #[error("Configuration validation error: {0}")]
    Validation(String),

    /// A save was attempted with no explicit path and no associated path.
    #[error("No file path specified")]
    NoPath,

    /// Underlying read/write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A probe or connect found the port held by another process.
    #[error("Port is in use by another application")]
    PortUnavailable,

    /// A probe or connect failed for any reason other than contention.
    #[error("Serial port error: {0}")]
    Port(String),

    /// An operation required an open board connection and none exists.
    #[error("No board connected")]
    NotConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_reason() {
        let err = PanelError::Validation("pin 7 reused".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration validation error: pin 7 reused"
        );
    }

    #[test]
    fn io_errors_convert_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PanelError = io.into();
        assert!(matches!(err, PanelError::Io(_)));
    }
}
