//! Conflict Export - Write query results for external analysis
//!
//! Exports joined event/threat actor rows (`AttributedEvent`) as:
//!
//! - **CSV**: fixed 19-column header, one line per row
//! - **JSON**: pretty-printed array
//! - **Text**: human-readable listing
//!
//! # Example
//!
//! ```rust,ignore
//! use conflict_db::Store;
//! use conflict_export::{ExportFormat, Exporter};
//!
//! let store = Store::open("events.db")?;
//! let rows = store.search_ukraine_attacked_by_russia()?;
//! Exporter::new(&rows).write_file("ukraine.csv", ExportFormat::Csv)?;
//! ```

mod error;
mod exporter;

pub use error::{Error, Result};
pub use exporter::{ExportFormat, Exporter, CSV_HEADERS};
