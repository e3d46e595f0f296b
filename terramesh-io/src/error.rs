//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading or writing build artifacts
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("Offset table entry {index} out of range: {offset}")]
    BadOffset { index: usize, offset: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for terramesh I/O operations
pub type Result<T> = std::result::Result<T, IoError>;
