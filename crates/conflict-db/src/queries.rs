//! Common query patterns for the store.
//!
//! Every search evaluates an `EventQuery` over stored rows. Searches that
//! read threat actor columns run over the event/threat actor inner join and
//! return `AttributedEvent`s; the rest return raw `Event`s.

use crate::error::Result;
use crate::store::{Store, StoreCounts};
use conflict_core::{AttributedEvent, DateRange, Event, EventQuery, ThreatActor};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

impl Store {
    /// Events matching a query.
    pub fn search(&self, query: &EventQuery) -> Result<Vec<Event>> {
        Ok(query.apply(self.all_events()?))
    }

    /// Attributed events matching a query.
    pub fn search_attributed(&self, query: &EventQuery) -> Result<Vec<AttributedEvent>> {
        Ok(query.apply(self.attributed_events()?))
    }

    /// Join every event with the threat actor it references.
    ///
    /// Events without a reference, or whose reference does not resolve, are
    /// left out.
    pub fn attributed_events(&self) -> Result<Vec<AttributedEvent>> {
        let actors: HashMap<String, ThreatActor> = self
            .all_threat_actors()?
            .into_iter()
            .map(|actor| (actor.key.clone(), actor))
            .collect();

        Ok(self
            .all_events()?
            .into_iter()
            .filter_map(|event| {
                let actor = actors.get(event.threat_actor_key.as_deref()?)?.clone();
                Some(AttributedEvent::new(event, actor))
            })
            .collect())
    }

    /// Events starting within a date range.
    pub fn search_by_date_range(&self, range: &DateRange) -> Result<Vec<Event>> {
        self.search(&EventQuery::new().in_range(range.clone()))
    }

    /// Events on Ukrainian victims by actors allied with the Russian Federation.
    pub fn search_ukraine_attacked_by_russia(&self) -> Result<Vec<AttributedEvent>> {
        self.search_attributed(&EventQuery::ukraine_attacked_by_russia())
    }

    /// Events on victims in `country` by actors with the given allegiance.
    pub fn search_by_country_and_allegiance(
        &self,
        country: &str,
        allegiance: &str,
    ) -> Result<Vec<AttributedEvent>> {
        self.search_attributed(
            &EventQuery::new()
                .in_country(country)
                .by_allegiance(allegiance),
        )
    }

    /// Events within a date range by actors with the given allegiance.
    pub fn search_by_date_range_and_allegiance(
        &self,
        range: &DateRange,
        allegiance: &str,
    ) -> Result<Vec<AttributedEvent>> {
        self.search_attributed(
            &EventQuery::new()
                .in_range(range.clone())
                .by_allegiance(allegiance),
        )
    }

    /// Events attributed to a threat actor key.
    pub fn search_by_threat_actor_key(&self, key: &str) -> Result<Vec<AttributedEvent>> {
        self.search_attributed(&EventQuery::new().by_threat_actor_key(key))
    }

    /// Events attributed to a threat actor name.
    pub fn search_by_threat_actor_name(&self, name: &str) -> Result<Vec<AttributedEvent>> {
        self.search_attributed(&EventQuery::new().by_threat_actor_name(name))
    }

    /// Events attributed to actors with the given allegiance.
    pub fn search_by_allegiance(&self, allegiance: &str) -> Result<Vec<AttributedEvent>> {
        self.search_attributed(&EventQuery::new().by_allegiance(allegiance))
    }

    /// Events of a specific type.
    pub fn search_by_event_type(&self, event_type: &str) -> Result<Vec<Event>> {
        self.search(&EventQuery::new().of_type(event_type))
    }

    /// Events whose description or name contains a keyword, ignoring case.
    pub fn search_by_keyword(&self, keyword: &str) -> Result<Vec<Event>> {
        self.search(&EventQuery::new().with_keyword(keyword))
    }

    /// All distinct event types.
    pub fn unique_event_types(&self) -> Result<BTreeSet<String>> {
        Ok(self.unique_event_types_with_count()?.into_keys().collect())
    }

    /// Distinct event types with the number of events of each.
    pub fn unique_event_types_with_count(&self) -> Result<BTreeMap<String, u64>> {
        Ok(group(self.all_events()?.into_iter().map(|e| e.event_type)))
    }

    /// All distinct threat actor names.
    pub fn unique_threat_actor_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.unique_threat_actor_names_with_count()?.into_keys().collect())
    }

    /// Distinct threat actor names with the number of actors sharing each.
    pub fn unique_threat_actor_names_with_count(&self) -> Result<BTreeMap<String, u64>> {
        Ok(group(self.all_threat_actors()?.into_iter().map(|a| a.name)))
    }

    /// All distinct threat actor keys.
    pub fn unique_threat_actor_keys(&self) -> Result<BTreeSet<String>> {
        Ok(self.unique_threat_actor_keys_with_count()?.into_keys().collect())
    }

    /// Distinct threat actor keys with their occurrence count.
    pub fn unique_threat_actor_keys_with_count(&self) -> Result<BTreeMap<String, u64>> {
        Ok(group(
            self.all_threat_actors()?.into_iter().map(|a| Some(a.key)),
        ))
    }

    /// Row counts and the grouped aggregates in one report.
    pub fn summary(&self) -> Result<Summary> {
        Ok(Summary {
            counts: self.counts()?,
            event_types: self.unique_event_types_with_count()?,
            threat_actor_names: self.unique_threat_actor_names_with_count()?,
            threat_actor_keys: self.unique_threat_actor_keys_with_count()?,
        })
    }
}

// Missing values do not form a group.
fn group(values: impl IntoIterator<Item = Option<String>>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Overview of the stored data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Rows per table
    pub counts: StoreCounts,
    /// Events per event type
    pub event_types: BTreeMap<String, u64>,
    /// Threat actors per name
    pub threat_actor_names: BTreeMap<String, u64>,
    /// Threat actors per key
    pub threat_actor_keys: BTreeMap<String, u64>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Store Summary ===")?;
        writeln!(f, "{}", self.counts)?;

        if !self.event_types.is_empty() {
            writeln!(f, "\nEvents by type:")?;
            let mut sorted: Vec<_> = self.event_types.iter().collect();
            sorted.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
            for (event_type, count) in sorted {
                writeln!(f, "  {}: {}", event_type, count)?;
            }
        }

        if !self.threat_actor_names.is_empty() {
            writeln!(f, "\nThreat actors by name:")?;
            for (name, count) in &self.threat_actor_names {
                writeln!(f, "  {}: {}", name, count)?;
            }
        }

        if !self.threat_actor_keys.is_empty() {
            writeln!(f, "\nThreat actors by key:")?;
            for (key, count) in &self.threat_actor_keys {
                writeln!(f, "  {}: {}", key, count)?;
            }
        }

        Ok(())
    }
}
