//! Global error handling for projdump
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::clipboard::ClipboardError;
use crate::storage::StorageError;

/// Global error type for projdump operations
#[derive(Error, Debug)]
pub enum ProjDumpError {
    /// The analyzer was given a root that is missing or not a directory
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// History or template store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Clipboard errors
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Failed to hand a path to the platform opener
    #[error("Failed to open {path}: {reason}")]
    Launch {
        /// Path that was being opened
        path: PathBuf,
        /// Why the opener failed
        reason: String,
    },

    /// A history record or template id that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Specialized Result type for projdump operations
pub type Result<T> = std::result::Result<T, ProjDumpError>;

/// Creates a ProjDumpError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::ProjDumpError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// Lets the binary and tests fall back to io::Result where convenient
impl From<ProjDumpError> for io::Error {
    fn from(err: ProjDumpError) -> Self {
        match err {
            ProjDumpError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
