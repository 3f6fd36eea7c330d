//! Conflict Core - Domain model for cyber-conflict incident data
//!
//! This crate provides the types shared by the store, exporter and CLI:
//! - Loosely typed ingestion input (`ImpactRecord`) as published by the
//!   CyberPeace Institute impacts API
//! - Typed rows (`Event`, `ThreatActor`, `Source`) and the joined
//!   `AttributedEvent` shape
//! - Date ranges and `EventQuery`, a set of typed predicates that evaluate
//!   the same way against stored data and already-fetched results
//!
//! ## Result Shapes
//!
//! Queries return either raw `Event` rows or `AttributedEvent` rows (an event
//! joined with its threat actor). Both implement `EventRow`, so any
//! `EventQuery` can narrow either kind of result set:
//!
//! ```rust
//! use conflict_core::{Event, EventQuery};
//!
//! let rows = vec![Event {
//!     key: "E1".to_string(),
//!     name: Some("Ransomware Attack".to_string()),
//!     ..Default::default()
//! }];
//! let hits = EventQuery::new().with_keyword("RANSOMWARE").apply(rows);
//! assert_eq!(hits.len(), 1);
//! ```

mod error;
mod model;
pub mod query;
pub mod record;

pub use error::{Error, Result};
pub use model::{AttributedEvent, Event, Source, ThreatActor};
pub use query::{DateRange, EventQuery, EventRow};
pub use record::{EventFields, ImpactRecord, LocationFields, SourceFields, ThreatActorFields};
