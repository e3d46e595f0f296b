//! Error types for terramesh

use thiserror::Error;

/// Main error type for terramesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Missing boundary slot {slot} on tile ({x}, {z})")]
    MissingBoundary { slot: u8, x: u32, z: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for terramesh operations
pub type Result<T> = std::result::Result<T, Error>;
