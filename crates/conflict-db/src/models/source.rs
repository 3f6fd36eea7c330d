//! Source model for database storage.

use conflict_core::{Source, SourceFields};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored source citation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredSource {
    /// Primary key - generated, increasing.
    #[primary_key]
    pub id: u64,
    /// URL - natural dedup key.
    #[secondary_key]
    pub url: String,
    /// Owning event key.
    pub event_key: Option<String>,
    pub title: Option<String>,
    pub source_name: Option<String>,
}

impl StoredSource {
    /// Create from a record's source entry.
    pub fn new(id: u64, url: &str, event_key: Option<&str>, fields: &SourceFields) -> Self {
        Self {
            id,
            url: url.to_string(),
            event_key: event_key.map(str::to_string),
            title: fields.title.clone(),
            source_name: fields.source_name.clone(),
        }
    }

    /// Convert to a source row.
    pub fn into_source(self) -> Source {
        Source {
            id: self.id,
            event_key: self.event_key,
            url: self.url,
            title: self.title,
            source_name: self.source_name,
        }
    }
}
