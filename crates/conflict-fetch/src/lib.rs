//! Conflict Fetch - Download impact records
//!
//! A single blocking GET against the impacts endpoint. The response body is
//! kept as opaque JSON and saved, pretty-printed, to `data_YYYY-MM-DD.json`.
//! Anything but status 200 is a failure; there are no retries.

mod error;
mod fetcher;

pub use error::{Error, Result};
pub use fetcher::{dated_file_name, FetchConfig, Fetcher, DEFAULT_URL};
