//! Conflict DB - Incident store using native_db
//!
//! Provides persistent storage for:
//! - Events (primary key: event key)
//! - Threat actors (primary key: actor key)
//! - Sources (generated id, deduplicated by URL)
//!
//! plus create-once ingestion of API records and the query layer.

mod error;
mod ingest;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use ingest::{ConflictPolicy, IngestReport, RowCounts};
pub use queries::Summary;
pub use store::{Store, StoreCounts};
