//! Typed rows for events, threat actors and sources

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single recorded cyber-incident occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique event key
    pub key: String,
    pub description: Option<String>,
    /// Confidence label as published (e.g. "Confirmed")
    pub confidence: Option<String>,
    /// Start date/time, ISO-8601
    pub date_from: Option<String>,
    pub name: Option<String>,
    pub event_type: Option<String>,
    /// Victim country
    pub country: Option<String>,
    pub country_abbreviation: Option<String>,
    /// Key of the attributed threat actor, if any
    pub threat_actor_key: Option<String>,
}

/// An attributed adversary entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatActor {
    /// Unique threat actor key
    pub key: String,
    pub name: Option<String>,
    pub actor_type: Option<String>,
    pub profiled: Option<String>,
    pub identifiers: Option<String>,
    pub active: Option<String>,
    pub apt: Option<String>,
    /// Claimed or attributed national/political affiliation
    pub allegiance: Option<String>,
    pub origin: Option<String>,
    pub targeted_sectors: Option<String>,
    pub description: Option<String>,
}

impl fmt::Display for ThreatActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("")
        }

        writeln!(f, "Threat Actor Profile:")?;
        writeln!(f, "Key: {}", self.key)?;
        writeln!(f, "Name: {}", show(&self.name))?;
        writeln!(f, "Type: {}", show(&self.actor_type))?;
        writeln!(f, "Profiled: {}", show(&self.profiled))?;
        writeln!(f, "Identifiers: {}", show(&self.identifiers))?;
        writeln!(f, "Active: {}", show(&self.active))?;
        writeln!(f, "APT: {}", show(&self.apt))?;
        writeln!(f, "Allegiance: {}", show(&self.allegiance))?;
        writeln!(f, "Origin: {}", show(&self.origin))?;
        writeln!(f, "Targeted Sectors: {}", show(&self.targeted_sectors))?;
        write!(f, "Description: {}", show(&self.description))
    }
}

/// A citation supporting an event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Store-generated identifier
    pub id: u64,
    /// Owning event; may not resolve (orphaned source)
    pub event_key: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub source_name: Option<String>,
}

/// An event joined with the threat actor its reference resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributedEvent {
    pub event: Event,
    pub threat_actor: ThreatActor,
}

impl AttributedEvent {
    /// Join an event with its threat actor.
    pub fn new(event: Event, threat_actor: ThreatActor) -> Self {
        Self {
            event,
            threat_actor,
        }
    }

    /// The event key.
    pub fn key(&self) -> &str {
        &self.event.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_actor_profile() {
        let actor = ThreatActor {
            key: "ITARMYOFUKRAINE".to_string(),
            name: Some("IT Army of Ukraine".to_string()),
            allegiance: Some("Ukraine".to_string()),
            ..Default::default()
        };
        let profile = actor.to_string();

        assert!(profile.starts_with("Threat Actor Profile:\n"));
        assert!(profile.contains("Key: ITARMYOFUKRAINE\n"));
        assert!(profile.contains("Name: IT Army of Ukraine\n"));
        assert!(profile.contains("APT: \n"));
        assert!(profile.ends_with("Description: "));
    }

    #[test]
    fn test_attributed_event_key() {
        let row = AttributedEvent::new(
            Event {
                key: "E1".to_string(),
                ..Default::default()
            },
            ThreatActor::default(),
        );
        assert_eq!(row.key(), "E1");
    }
}
