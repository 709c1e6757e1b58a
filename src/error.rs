//! Error types for the pose viewer.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Camera failed to open, or a file could not be opened or decoded
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Frame with zero width/height or an unusable pixel buffer
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Pose detector failed on a frame
    #[error("Detector error: {0}")]
    Detector(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
