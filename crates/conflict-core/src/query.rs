//! Typed predicates over event result sets
//!
//! An `EventQuery` is evaluated by the store against persisted rows and by
//! `EventQuery::apply` against rows a caller already holds. Both paths run
//! the same `matches` predicate.

use crate::error::{Error, Result};
use crate::model::{AttributedEvent, Event, ThreatActor};
use chrono::NaiveDate;

/// Victim country of the adversary-relationship preset.
pub const UKRAINE: &str = "Ukraine";

/// Threat actor allegiance of the adversary-relationship preset.
pub const RUSSIAN_FEDERATION: &str = "Russian Federation";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of event start times.
///
/// Bounds are calendar dates normalized to midnight UTC and compared against
/// `eventDateFrom` as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: String,
    end: String,
}

impl DateRange {
    /// Parse `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::from_dates(parse_date(start)?, parse_date(end)?))
    }

    /// Build a range from calendar dates.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: midnight_utc(start),
            end: midnight_utc(end),
        }
    }

    /// Lower bound, e.g. `2023-05-01T00:00:00Z`.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Upper bound, e.g. `2023-05-31T00:00:00Z`.
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Check whether an ISO-8601 timestamp falls within the range.
    pub fn contains(&self, timestamp: &str) -> bool {
        self.start.as_str() <= timestamp && timestamp <= self.end.as_str()
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|e| Error::InvalidDate {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

fn midnight_utc(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format(DATE_FORMAT))
}

/// A row that carries an event and possibly its resolved threat actor.
pub trait EventRow {
    /// The event columns.
    fn event(&self) -> &Event;

    /// The joined threat actor; `None` for raw event rows.
    fn threat_actor(&self) -> Option<&ThreatActor>;
}

impl EventRow for Event {
    fn event(&self) -> &Event {
        self
    }

    fn threat_actor(&self) -> Option<&ThreatActor> {
        None
    }
}

impl EventRow for AttributedEvent {
    fn event(&self) -> &Event {
        &self.event
    }

    fn threat_actor(&self) -> Option<&ThreatActor> {
        Some(&self.threat_actor)
    }
}

/// Filter criteria for events. Every criterion set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Start time within range (inclusive)
    pub date_range: Option<DateRange>,
    /// Exact event type
    pub event_type: Option<String>,
    /// Case-insensitive substring of description or name
    pub keyword: Option<String>,
    /// Exact victim country
    pub country: Option<String>,
    /// Exact threat actor reference on the event
    pub threat_actor_key: Option<String>,
    /// Exact threat actor name (needs a joined row)
    pub threat_actor_name: Option<String>,
    /// Exact threat actor allegiance (needs a joined row)
    pub allegiance: Option<String>,
}

impl EventQuery {
    /// Create a new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Events on Ukrainian victims by actors allied with the Russian Federation.
    pub fn ukraine_attacked_by_russia() -> Self {
        Self::new()
            .in_country(UKRAINE)
            .by_allegiance(RUSSIAN_FEDERATION)
    }

    /// Filter by date range
    pub fn in_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Filter by event type
    pub fn of_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Filter by keyword in description or name
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Filter by victim country
    pub fn in_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Filter by threat actor key
    pub fn by_threat_actor_key(mut self, key: impl Into<String>) -> Self {
        self.threat_actor_key = Some(key.into());
        self
    }

    /// Filter by threat actor name
    pub fn by_threat_actor_name(mut self, name: impl Into<String>) -> Self {
        self.threat_actor_name = Some(name.into());
        self
    }

    /// Filter by threat actor allegiance
    pub fn by_allegiance(mut self, allegiance: impl Into<String>) -> Self {
        self.allegiance = Some(allegiance.into());
        self
    }

    /// Whether any criterion reads threat actor columns.
    pub fn needs_threat_actor(&self) -> bool {
        self.threat_actor_name.is_some() || self.allegiance.is_some()
    }

    /// Check a single row.
    pub fn matches<R: EventRow + ?Sized>(&self, row: &R) -> bool {
        let event = row.event();

        if let Some(range) = &self.date_range {
            if !event.date_from.as_deref().is_some_and(|d| range.contains(d)) {
                return false;
            }
        }
        if !equals(&event.event_type, &self.event_type)
            || !equals(&event.country, &self.country)
            || !equals(&event.threat_actor_key, &self.threat_actor_key)
        {
            return false;
        }
        if let Some(keyword) = &self.keyword {
            if !contains_keyword(event, keyword) {
                return false;
            }
        }

        if self.needs_threat_actor() {
            let Some(actor) = row.threat_actor() else {
                return false;
            };
            if !equals(&actor.name, &self.threat_actor_name)
                || !equals(&actor.allegiance, &self.allegiance)
            {
                return false;
            }
        }

        true
    }

    /// Narrow an already-fetched result set.
    pub fn apply<R: EventRow>(&self, rows: Vec<R>) -> Vec<R> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }

    /// Borrowing variant of [`EventQuery::apply`].
    pub fn filter<'a, R: EventRow>(&self, rows: &'a [R]) -> Vec<&'a R> {
        rows.iter().filter(|row| self.matches(*row)).collect()
    }
}

fn equals(value: &Option<String>, wanted: &Option<String>) -> bool {
    match wanted {
        Some(wanted) => value.as_deref() == Some(wanted.as_str()),
        None => true,
    }
}

fn contains_keyword(event: &Event, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    [&event.description, &event.name]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&needle))
}
