//! Error types for conflict-fetch

use thiserror::Error;

/// Fetch error type
#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint answered with anything but 200
    #[error("Failed to fetch data. Status code: {0}")]
    Status(u16),

    /// Header name or value rejected by the HTTP client
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body was not JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, Error>;
