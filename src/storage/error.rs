/*!
 * Error types for the storage module
 */

use std::io;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing a store
///
/// Undecodable documents are not errors: they are repaired on read.
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Could not determine where to keep the stores
    #[error("Storage directory unavailable: {0}")]
    NoStorageDir(String),

    /// A value the store refuses to save
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
