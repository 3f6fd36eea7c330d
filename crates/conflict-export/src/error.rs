//! Error types for conflict-export

use thiserror::Error;

/// Export error type
#[derive(Debug, Error)]
pub enum Error {
    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Unknown export format name
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;
