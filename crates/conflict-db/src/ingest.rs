//! Create-once ingestion of API records.

use crate::error::Result;
use crate::models::*;
use crate::store::{collect, Store};
use conflict_core::ImpactRecord;
use native_db::transaction::RwTransaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// What ingestion does with a key (or source URL) that is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Keep the stored row; the incoming record is ignored (default)
    #[default]
    Skip,
    /// Overwrite the stored row with the incoming record
    Replace,
}

/// Per-table outcome of an ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    /// Rows that did not exist before
    pub inserted: usize,
    /// Existing rows overwritten under `ConflictPolicy::Replace`
    pub replaced: usize,
    /// Rows left untouched (already stored, or no dedup key)
    pub skipped: usize,
}

impl fmt::Display for RowCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} replaced, {} skipped",
            self.inserted, self.replaced, self.skipped
        )
    }
}

/// Outcome of one `Store::ingest` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records processed
    pub records: usize,
    pub events: RowCounts,
    pub threat_actors: RowCounts,
    pub sources: RowCounts,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ingest Report ===")?;
        writeln!(f, "Records: {}", self.records)?;
        writeln!(f, "Events: {}", self.events)?;
        writeln!(f, "Threat actors: {}", self.threat_actors)?;
        write!(f, "Sources: {}", self.sources)
    }
}

impl Store {
    /// Persist a batch of records.
    ///
    /// Per record: the event is stored if it has a key, the threat actor if it
    /// has a key, and every source with a URL not yet stored is attached to
    /// the record's event key. Keys and URLs already present are handled per
    /// the store's `ConflictPolicy`, so re-ingesting a batch is idempotent
    /// under the default policy.
    ///
    /// All writes go through one transaction committed at the end; an error
    /// aborts the whole batch.
    pub fn ingest(&self, records: &[ImpactRecord]) -> Result<IngestReport> {
        let mut report = IngestReport {
            records: records.len(),
            ..Default::default()
        };

        let rw = self.db.rw_transaction()?;
        let mut next_source_id = next_source_id(&rw)?;

        for record in records {
            if let Some(event) = record.event_row() {
                let existing: Option<StoredEvent> = rw.get().primary(event.key.clone())?;
                match (existing, self.policy) {
                    (None, _) => {
                        rw.insert(StoredEvent::from_event(&event))?;
                        report.events.inserted += 1;
                    }
                    (Some(_), ConflictPolicy::Skip) => {
                        debug!(key = %event.key, "event already stored");
                        report.events.skipped += 1;
                    }
                    (Some(_), ConflictPolicy::Replace) => {
                        rw.upsert(StoredEvent::from_event(&event))?;
                        report.events.replaced += 1;
                    }
                }
            }

            if let Some(actor) = record.threat_actor_row() {
                let existing: Option<StoredThreatActor> = rw.get().primary(actor.key.clone())?;
                match (existing, self.policy) {
                    (None, _) => {
                        rw.insert(StoredThreatActor::from_threat_actor(&actor))?;
                        report.threat_actors.inserted += 1;
                    }
                    (Some(_), ConflictPolicy::Skip) => {
                        debug!(key = %actor.key, "threat actor already stored");
                        report.threat_actors.skipped += 1;
                    }
                    (Some(_), ConflictPolicy::Replace) => {
                        rw.upsert(StoredThreatActor::from_threat_actor(&actor))?;
                        report.threat_actors.replaced += 1;
                    }
                }
            }

            for source in &record.sources {
                let Some(url) = source.url() else {
                    debug!(event = ?record.event_key(), "source without URL");
                    report.sources.skipped += 1;
                    continue;
                };
                match (source_with_url(&rw, url)?, self.policy) {
                    (None, _) => {
                        rw.insert(StoredSource::new(
                            next_source_id,
                            url,
                            record.event_key(),
                            source,
                        ))?;
                        next_source_id += 1;
                        report.sources.inserted += 1;
                    }
                    (Some(_), ConflictPolicy::Skip) => {
                        debug!(url, "source already stored");
                        report.sources.skipped += 1;
                    }
                    (Some(existing), ConflictPolicy::Replace) => {
                        rw.upsert(StoredSource {
                            title: source.title.clone(),
                            source_name: source.source_name.clone(),
                            ..existing
                        })?;
                        report.sources.replaced += 1;
                    }
                }
            }
        }

        rw.commit()?;
        info!(
            records = report.records,
            events = report.events.inserted,
            threat_actors = report.threat_actors.inserted,
            sources = report.sources.inserted,
            "ingested batch"
        );
        Ok(report)
    }
}

// Scans are scoped to these helpers so their tables are closed again before
// the transaction writes.

fn next_source_id(rw: &RwTransaction<'_>) -> Result<u64> {
    let scan = rw.scan().primary::<StoredSource>()?;
    let iter = scan.all()?;
    let sources = collect(iter)?;
    Ok(sources.iter().map(|s| s.id).max().map_or(1, |id| id + 1))
}

fn source_with_url(rw: &RwTransaction<'_>, url: &str) -> Result<Option<StoredSource>> {
    let scan = rw.scan().secondary::<StoredSource>(StoredSourceKey::url)?;
    let iter = scan.start_with(url)?;
    let candidates = collect(iter)?;
    Ok(candidates.into_iter().find(|s| s.url == url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreCounts;
    use serde_json::json;

    fn batch(value: serde_json::Value) -> Vec<ImpactRecord> {
        ImpactRecord::from_value(value).unwrap()
    }

    fn example_batch() -> Vec<ImpactRecord> {
        batch(json!([
            {
                "event": { "_key": "E1", "type": "Malware", "eventDateFrom": "2023-05-01T00:00:00Z" },
                "threatActor": { "_key": "TA1", "allegiance": "Russian Federation" },
                "location": { "country": "Ukraine" },
                "sources": [
                    { "URL": "https://example.org/shared", "title": "Shared" },
                    { "URL": "https://example.org/e1" }
                ]
            },
            {
                "event": { "_key": "E2", "type": "DDoS" },
                "threatActor": { "_key": "TA1", "allegiance": "Russian Federation" },
                "sources": [{ "URL": "https://example.org/shared", "title": "Shared again" }]
            }
        ]))
    }

    #[test]
    fn test_ingest_counts() {
        let store = Store::in_memory().unwrap();
        let report = store.ingest(&example_batch()).unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(report.events.inserted, 2);
        assert_eq!(report.threat_actors.inserted, 1);
        assert_eq!(report.threat_actors.skipped, 1);
        assert_eq!(report.sources.inserted, 2);
        assert_eq!(report.sources.skipped, 1);
    }

    #[test]
    fn test_ingest_is_idempotent() {
        let store = Store::in_memory().unwrap();
        store.ingest(&example_batch()).unwrap();
        let first = store.counts().unwrap();

        let report = store.ingest(&example_batch()).unwrap();
        assert_eq!(store.counts().unwrap(), first);
        assert_eq!(report.events.inserted, 0);
        assert_eq!(report.threat_actors.inserted, 0);
        assert_eq!(report.sources.inserted, 0);
        assert_eq!(
            first,
            StoreCounts {
                events: 2,
                threat_actors: 1,
                sources: 2
            }
        );
    }

    #[test]
    fn test_duplicate_url_stored_once() {
        let store = Store::in_memory().unwrap();
        store.ingest(&example_batch()).unwrap();

        let shared: Vec<_> = store
            .all_sources()
            .unwrap()
            .into_iter()
            .filter(|s| s.url == "https://example.org/shared")
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].event_key.as_deref(), Some("E1"));
        assert_eq!(shared[0].title.as_deref(), Some("Shared"));
    }

    #[test]
    fn test_source_ids_increase() {
        let store = Store::in_memory().unwrap();
        store.ingest(&example_batch()).unwrap();
        store
            .ingest(&batch(json!([
                { "event": { "_key": "E3" }, "sources": [{ "URL": "https://example.org/e3" }] }
            ])))
            .unwrap();

        let ids: Vec<u64> = store.all_sources().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_fields_degrade() {
        let store = Store::in_memory().unwrap();
        let report = store
            .ingest(&batch(json!([
                {},
                { "event": { "description": "no key" } },
                { "threatActor": { "_key": "TA9" } },
                { "sources": [{ "title": "no url" }, { "URL": "https://example.org/orphan" }] }
            ])))
            .unwrap();

        assert_eq!(report.events.inserted, 0);
        assert_eq!(report.threat_actors.inserted, 1);
        assert_eq!(report.sources.inserted, 1);
        assert_eq!(report.sources.skipped, 1);

        let orphan = store
            .source_by_url("https://example.org/orphan")
            .unwrap()
            .unwrap();
        assert_eq!(orphan.event_key, None);
        let actor = store.threat_actor("TA9").unwrap().unwrap();
        assert_eq!(actor.name, None);
    }

    #[test]
    fn test_skip_keeps_stale_rows() {
        let store = Store::in_memory().unwrap();
        store
            .ingest(&batch(json!([{ "event": { "_key": "E1", "eventName": "old" } }])))
            .unwrap();
        store
            .ingest(&batch(json!([{ "event": { "_key": "E1", "eventName": "new" } }])))
            .unwrap();

        let event = store.event("E1").unwrap().unwrap();
        assert_eq!(event.name.as_deref(), Some("old"));
    }

    #[test]
    fn test_replace_policy_overwrites() {
        let store = Store::in_memory()
            .unwrap()
            .with_policy(ConflictPolicy::Replace);
        store.ingest(&example_batch()).unwrap();

        let report = store
            .ingest(&batch(json!([{
                "event": { "_key": "E1", "eventName": "renamed" },
                "threatActor": { "_key": "TA1", "name": "Sandworm" },
                "sources": [{ "URL": "https://example.org/e1", "title": "Updated title" }]
            }])))
            .unwrap();

        assert_eq!(report.events.replaced, 1);
        assert_eq!(report.threat_actors.replaced, 1);
        assert_eq!(report.sources.replaced, 1);
        assert_eq!(store.counts().unwrap().sources, 2);

        let event = store.event("E1").unwrap().unwrap();
        assert_eq!(event.name.as_deref(), Some("renamed"));
        assert_eq!(event.event_type, None);

        let source = store.source_by_url("https://example.org/e1").unwrap().unwrap();
        assert_eq!(source.title.as_deref(), Some("Updated title"));
        assert_eq!(source.event_key.as_deref(), Some("E1"));
    }

    #[test]
    fn test_report_display() {
        let store = Store::in_memory().unwrap();
        let report = store.ingest(&example_batch()).unwrap();
        let text = report.to_string();

        assert!(text.starts_with("=== Ingest Report ==="));
        assert!(text.contains("Events: 2 inserted, 0 replaced, 0 skipped"));
    }
}
