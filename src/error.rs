//! Error types and handling infrastructure for rzf.
//!
//! Library code returns [`RzfError`] (built with `thiserror`); the binary wraps it in
//! `anyhow` to add context before printing.
//!
//! Errors fall in two groups. User errors, such as selecting past the end of the view, are
//! reported and the session keeps running. Everything else ends the run with exit status 2.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rzf operations.
///
/// Covers ingestion, matching, session coordination and the terminal front-end.
#[derive(Error, Debug)]
pub enum RzfError {
    /// Reading from a candidate source failed (broken pipe, read error, etc.)
    #[error("Input source failed: {message}")]
    SourceError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Input file not found specifically (common case for user feedback)
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path exists but is not a regular file
    #[error("Path is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// Generator command could not be spawned or exited unsuccessfully
    #[error("Command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Compression format detection or decompression errors
    #[error("Compression error: {message}")]
    CompressionError { message: String },

    /// Selection index outside the currently published view
    #[error("Selection {index} is out of bounds (view has {len} entries)")]
    SelectionOutOfBounds { index: usize, len: usize },

    /// Matching session errors (worker gone, channel closed)
    #[error("Session failed: {message}")]
    SessionError { message: String },

    /// UI and terminal related errors
    #[error("UI operation failed: {message}")]
    UIError { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid command line arguments
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for rzf operations.
pub type Result<T> = std::result::Result<T, RzfError>;

impl RzfError {
    /// Create a SourceError from an io::Error with additional context
    pub fn source_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::SourceError {
            message: message.into(),
            source,
        }
    }

    /// Create a CommandFailed error for a generator command
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a CompressionError with a descriptive message
    pub fn compression(message: impl Into<String>) -> Self {
        Self::CompressionError {
            message: message.into(),
        }
    }

    /// Create a SessionError with a descriptive message
    pub fn session(message: impl Into<String>) -> Self {
        Self::SessionError {
            message: message.into(),
        }
    }

    /// Create a UIError with a descriptive message
    pub fn ui(message: impl Into<String>) -> Self {
        Self::UIError {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an InvalidArgument error with a descriptive message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether the error is a user mistake the UI should report and then keep running.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::SelectionOutOfBounds { .. })
    }
}

// Automatic conversion from io::Error to RzfError
impl From<std::io::Error> for RzfError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::BrokenPipe => Self::SourceError {
                message: "Broken pipe".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::SourceError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::SourceError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display_messages() {
        let path = PathBuf::from("/test/candidates.txt");

        let file_not_found = RzfError::FileNotFound { path: path.clone() };
        assert_eq!(
            file_not_found.to_string(),
            "File not found: /test/candidates.txt"
        );

        let not_a_file = RzfError::NotAFile { path };
        assert_eq!(
            not_a_file.to_string(),
            "Path is not a regular file: /test/candidates.txt"
        );

        let out_of_bounds = RzfError::SelectionOutOfBounds { index: 7, len: 3 };
        assert_eq!(
            out_of_bounds.to_string(),
            "Selection 7 is out of bounds (view has 3 entries)"
        );

        let command = RzfError::command_failed("find .", "exit status 1");
        assert_eq!(command.to_string(), "Command `find .` failed: exit status 1");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            RzfError::session("worker gone"),
            RzfError::SessionError { .. }
        ));
        assert!(matches!(
            RzfError::ui("Terminal resize failed"),
            RzfError::UIError { .. }
        ));
        assert!(matches!(
            RzfError::config("bad theme"),
            RzfError::ConfigError { .. }
        ));
        assert!(matches!(
            RzfError::other("Unknown error"),
            RzfError::Other { .. }
        ));
    }

    #[test]
    fn test_user_error_classification() {
        assert!(RzfError::SelectionOutOfBounds { index: 1, len: 0 }.is_user_error());
        assert!(!RzfError::session("closed").is_user_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let rzf_err: RzfError = io_err.into();

        match rzf_err {
            RzfError::SourceError { message, .. } => {
                assert_eq!(message, "Broken pipe");
            }
            _ => panic!("Expected SourceError variant"),
        }
    }
}
