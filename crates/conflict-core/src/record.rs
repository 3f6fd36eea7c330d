//! Loosely typed ingestion input
//!
//! The impacts API publishes one record per incident with optional nested
//! `event`, `threatActor`, `location` and `sources` objects. Nothing is
//! validated here: absent objects decode as empty, absent or `null` fields as
//! `None`, and any scalar or structured value is kept as text.

use crate::error::{Error, Result};
use crate::model::{Event, ThreatActor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One incident record as published by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImpactRecord {
    #[serde(default, deserialize_with = "or_default")]
    pub event: EventFields,
    #[serde(default, rename = "threatActor", deserialize_with = "or_default")]
    pub threat_actor: ThreatActorFields,
    #[serde(default, deserialize_with = "or_default")]
    pub location: LocationFields,
    #[serde(default, deserialize_with = "or_default")]
    pub sources: Vec<SourceFields>,
}

/// The `event` sub-record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFields {
    #[serde(default, rename = "_key", deserialize_with = "loose_text")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub description: Option<String>,
    #[serde(default, rename = "eventConfidence", deserialize_with = "loose_text")]
    pub confidence: Option<String>,
    #[serde(default, rename = "eventDateFrom", deserialize_with = "loose_text")]
    pub date_from: Option<String>,
    #[serde(default, rename = "eventName", deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "loose_text")]
    pub event_type: Option<String>,
}

/// The `threatActor` sub-record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreatActorFields {
    #[serde(default, rename = "_key", deserialize_with = "loose_text")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "loose_text")]
    pub actor_type: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub profiled: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub identifiers: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub active: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub apt: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub allegiance: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub origin: Option<String>,
    #[serde(default, rename = "targetedSectors", deserialize_with = "loose_text")]
    pub targeted_sectors: Option<String>,
    #[serde(default, rename = "Description", deserialize_with = "loose_text")]
    pub description: Option<String>,
}

/// The `location` sub-record (victim country).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationFields {
    #[serde(default, deserialize_with = "loose_text")]
    pub country: Option<String>,
    #[serde(default, rename = "countryAbbreviation", deserialize_with = "loose_text")]
    pub country_abbreviation: Option<String>,
}

/// One entry of the `sources` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceFields {
    #[serde(default, rename = "URL", deserialize_with = "loose_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub title: Option<String>,
    #[serde(default, rename = "sourceName", deserialize_with = "loose_text")]
    pub source_name: Option<String>,
}

impl SourceFields {
    /// The dedup URL; an empty URL counts as missing.
    pub fn url(&self) -> Option<&str> {
        non_empty(&self.url)
    }
}

impl ImpactRecord {
    /// Decode a JSON array of records.
    pub fn parse_batch(json: &str) -> Result<Vec<ImpactRecord>> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON document, which must be an array.
    pub fn from_value(value: Value) -> Result<Vec<ImpactRecord>> {
        match value {
            Value::Array(_) => Ok(serde_json::from_value(value)?),
            other => Err(Error::InvalidBatch(format!(
                "expected an array of records, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Load a saved API response from disk.
    pub fn load_batch(path: impl AsRef<Path>) -> Result<Vec<ImpactRecord>> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_batch(&content)
    }

    /// The event key, if present and non-empty.
    pub fn event_key(&self) -> Option<&str> {
        non_empty(&self.event.key)
    }

    /// The threat actor key, if present and non-empty.
    pub fn threat_actor_key(&self) -> Option<&str> {
        non_empty(&self.threat_actor.key)
    }

    /// The event row to persist, pulling country fields from `location` and
    /// the actor reference from `threatActor`.
    pub fn event_row(&self) -> Option<Event> {
        let key = self.event_key()?;
        Some(Event {
            key: key.to_string(),
            description: self.event.description.clone(),
            confidence: self.event.confidence.clone(),
            date_from: self.event.date_from.clone(),
            name: self.event.name.clone(),
            event_type: self.event.event_type.clone(),
            country: self.location.country.clone(),
            country_abbreviation: self.location.country_abbreviation.clone(),
            threat_actor_key: self.threat_actor_key().map(str::to_string),
        })
    }

    /// The threat actor row to persist.
    pub fn threat_actor_row(&self) -> Option<ThreatActor> {
        let key = self.threat_actor_key()?;
        let actor = &self.threat_actor;
        Some(ThreatActor {
            key: key.to_string(),
            name: actor.name.clone(),
            actor_type: actor.actor_type.clone(),
            profiled: actor.profiled.clone(),
            identifiers: actor.identifiers.clone(),
            active: actor.active.clone(),
            apt: actor.apt.clone(),
            allegiance: actor.allegiance.clone(),
            origin: actor.origin.clone(),
            targeted_sectors: actor.targeted_sectors.clone(),
            description: actor.description.clone(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render any JSON value as text; `null` is missing.
fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn loose_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(text_of))
}

// `null` sub-records decode as empty ones.
fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
