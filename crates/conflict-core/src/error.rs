//! Error types for conflict-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid date '{input}': expected YYYY-MM-DD ({reason})")]
    InvalidDate { input: String, reason: String },

    #[error("Invalid record batch: {0}")]
    InvalidBatch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
