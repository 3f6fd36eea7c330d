//! Database store wrapper.

use crate::error::{Error, Result};
use crate::ingest::ConflictPolicy;
use crate::models::*;
use conflict_core::{Event, Source, ThreatActor};
use native_db::{Builder, Database, Models};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredEvent>().unwrap();
    models.define::<StoredThreatActor>().unwrap();
    models.define::<StoredSource>().unwrap();
    models
});

/// Incident store holding events, threat actors and sources.
///
/// A `Store` is the connection: open one per unit of work and drop it to
/// release the file.
pub struct Store {
    pub(crate) db: Database<'static>,
    pub(crate) policy: ConflictPolicy,
}

impl Store {
    /// Open or create a store at the given path.
    ///
    /// Opening an existing store leaves its contents untouched.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        tracing::debug!(path = %path.as_ref().display(), "opened store");
        Ok(Self {
            db,
            policy: ConflictPolicy::default(),
        })
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self {
            db,
            policy: ConflictPolicy::default(),
        })
    }

    /// Set how ingestion treats keys that are already stored.
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active conflict policy.
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Load an event by key.
    pub fn event(&self, key: &str) -> Result<Option<Event>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredEvent> = r.get().primary(key.to_string())?;
        Ok(stored.map(StoredEvent::into_event))
    }

    /// Load a threat actor by key.
    pub fn threat_actor(&self, key: &str) -> Result<Option<ThreatActor>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredThreatActor> = r.get().primary(key.to_string())?;
        Ok(stored.map(StoredThreatActor::into_threat_actor))
    }

    /// Load all events, ordered by key.
    pub fn all_events(&self) -> Result<Vec<Event>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredEvent>()?;
        let iter = scan.all()?;
        let events = collect(iter)?;
        Ok(events.into_iter().map(StoredEvent::into_event).collect())
    }

    /// Load all threat actors, ordered by key.
    pub fn all_threat_actors(&self) -> Result<Vec<ThreatActor>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredThreatActor>()?;
        let iter = scan.all()?;
        let actors = collect(iter)?;
        Ok(actors
            .into_iter()
            .map(StoredThreatActor::into_threat_actor)
            .collect())
    }

    /// Load all sources, ordered by id.
    pub fn all_sources(&self) -> Result<Vec<Source>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredSource>()?;
        let iter = scan.all()?;
        let sources = collect(iter)?;
        Ok(sources.into_iter().map(StoredSource::into_source).collect())
    }

    /// Get the sources citing an event.
    pub fn sources_for_event(&self, event_key: &str) -> Result<Vec<Source>> {
        Ok(self
            .all_sources()?
            .into_iter()
            .filter(|s| s.event_key.as_deref() == Some(event_key))
            .collect())
    }

    /// Find a source by its URL.
    pub fn source_by_url(&self, url: &str) -> Result<Option<Source>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredSource>(StoredSourceKey::url)?;
        let iter = scan.start_with(url)?;
        // start_with is a prefix scan
        let candidates = collect(iter)?;
        Ok(candidates
            .into_iter()
            .find(|s| s.url == url)
            .map(StoredSource::into_source))
    }

    /// Count rows per table.
    pub fn counts(&self) -> Result<StoreCounts> {
        let r = self.db.r_transaction()?;

        let scan = r.scan().primary::<StoredEvent>()?;
        let events = scan.all()?.count();

        let scan = r.scan().primary::<StoredThreatActor>()?;
        let threat_actors = scan.all()?.count();

        let scan = r.scan().primary::<StoredSource>()?;
        let sources = scan.all()?.count();

        Ok(StoreCounts {
            events,
            threat_actors,
            sources,
        })
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub events: usize,
    pub threat_actors: usize,
    pub sources: usize,
}

impl fmt::Display for StoreCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Events: {}", self.events)?;
        writeln!(f, "Threat actors: {}", self.threat_actors)?;
        write!(f, "Sources: {}", self.sources)
    }
}

/// Drain a native_db scan iterator.
pub(crate) fn collect<T, E: fmt::Display>(
    iter: impl Iterator<Item = std::result::Result<T, E>>,
) -> Result<Vec<T>> {
    iter.collect::<std::result::Result<Vec<T>, E>>()
        .map_err(|e| Error::Database(e.to_string()))
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}
