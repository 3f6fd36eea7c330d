//! Event and threat actor models for database storage.

use conflict_core::{Event, ThreatActor};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredEvent {
    /// Primary key - event key.
    #[primary_key]
    pub key: String,
    pub description: Option<String>,
    pub confidence: Option<String>,
    /// ISO-8601 start time.
    pub date_from: Option<String>,
    pub name: Option<String>,
    pub event_type: Option<String>,
    pub country: Option<String>,
    pub country_abbreviation: Option<String>,
    /// Reference to a threat actor key; not enforced.
    pub threat_actor_key: Option<String>,
}

impl StoredEvent {
    /// Create from an event row.
    pub fn from_event(event: &Event) -> Self {
        Self {
            key: event.key.clone(),
            description: event.description.clone(),
            confidence: event.confidence.clone(),
            date_from: event.date_from.clone(),
            name: event.name.clone(),
            event_type: event.event_type.clone(),
            country: event.country.clone(),
            country_abbreviation: event.country_abbreviation.clone(),
            threat_actor_key: event.threat_actor_key.clone(),
        }
    }

    /// Convert to an event row.
    pub fn into_event(self) -> Event {
        Event {
            key: self.key,
            description: self.description,
            confidence: self.confidence,
            date_from: self.date_from,
            name: self.name,
            event_type: self.event_type,
            country: self.country,
            country_abbreviation: self.country_abbreviation,
            threat_actor_key: self.threat_actor_key,
        }
    }
}

/// Stored threat actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredThreatActor {
    /// Primary key - threat actor key.
    #[primary_key]
    pub key: String,
    pub name: Option<String>,
    pub actor_type: Option<String>,
    pub profiled: Option<String>,
    pub identifiers: Option<String>,
    pub active: Option<String>,
    pub apt: Option<String>,
    pub allegiance: Option<String>,
    pub origin: Option<String>,
    pub targeted_sectors: Option<String>,
    pub description: Option<String>,
}

impl StoredThreatActor {
    /// Create from a threat actor row.
    pub fn from_threat_actor(actor: &ThreatActor) -> Self {
        Self {
            key: actor.key.clone(),
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
        }
    }

    /// Convert to a threat actor row.
    pub fn into_threat_actor(self) -> ThreatActor {
        ThreatActor {
            key: self.key,
            name: self.name,
            actor_type: self.actor_type,
            profiled: self.profiled,
            identifiers: self.identifiers,
            active: self.active,
            apt: self.apt,
            allegiance: self.allegiance,
            origin: self.origin,
            targeted_sectors: self.targeted_sectors,
            description: self.description,
        }
    }
}
