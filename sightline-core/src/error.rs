//! Error types for sightline

use thiserror::Error;

/// Main error type for sightline operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    /// The visibility oracle cannot answer queries (no session, no buffer, bad viewpoint).
    #[error("Visibility oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Rasterizer error: {0}")]
    Rasterizer(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type alias for sightline operations
pub type Result<T> = std::result::Result<T, Error>;
