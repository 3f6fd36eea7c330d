//! Export attributed events to various formats

use crate::{Error, Result};
use conflict_core::AttributedEvent;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// CSV header: event columns followed by threat actor columns.
///
/// The actor's own key is not repeated; `threatActorKey` carries it.
pub const CSV_HEADERS: [&str; 19] = [
    "_key",
    "description",
    "eventConfidence",
    "eventDateFrom",
    "eventName",
    "eventType",
    "country",
    "countryAbbreviation",
    "threatActorKey",
    "name",
    "type",
    "profiled",
    "identifiers",
    "active",
    "apt",
    "allegiance",
    "origin",
    "targetedSectors",
    "description",
];

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a fixed header
    Csv,
    /// Pretty-printed JSON array
    Json,
    /// Human-readable text format
    Text,
}

impl ExportFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Exporter for joined query results
pub struct Exporter<'a> {
    rows: &'a [AttributedEvent],
}

impl<'a> Exporter<'a> {
    /// Create a new exporter
    pub fn new(rows: &'a [AttributedEvent]) -> Self {
        Self { rows }
    }

    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Export to a file, replacing any existing content
    pub fn write_file(&self, path: impl AsRef<Path>, format: ExportFormat) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.export_to(&mut writer, format)?;
        writer.flush()?;
        Ok(())
    }

    /// Export to CSV format
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;

        for row in self.rows {
            writer.write_record(csv_row(row))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Export to JSON format
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self.rows).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Export to human-readable text format
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("=== {} attributed events ===\n", self.rows.len()));

        for row in self.rows {
            let event = &row.event;
            let actor = &row.threat_actor;

            output.push_str(&format!(
                "\n[{}] {}\n",
                event.key,
                event.name.as_deref().unwrap_or("(unnamed)")
            ));
            if let Some(date) = &event.date_from {
                output.push_str(&format!("  date: {}\n", date));
            }
            if let Some(event_type) = &event.event_type {
                output.push_str(&format!("  type: {}\n", event_type));
            }
            if let Some(country) = &event.country {
                output.push_str(&format!("  country: {}\n", country));
            }
            output.push_str(&format!(
                "  threat actor: {} ({})",
                actor.name.as_deref().unwrap_or("(unnamed)"),
                actor.key
            ));
            if let Some(allegiance) = &actor.allegiance {
                output.push_str(&format!(", allegiance {}", allegiance));
            }
            output.push('\n');
        }

        output
    }
}

fn csv_row(row: &AttributedEvent) -> [&str; 19] {
    fn cell(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("")
    }

    let event = &row.event;
    let actor = &row.threat_actor;
    [
        event.key.as_str(),
        cell(&event.description),
        cell(&event.confidence),
        cell(&event.date_from),
        cell(&event.name),
        cell(&event.event_type),
        cell(&event.country),
        cell(&event.country_abbreviation),
        cell(&event.threat_actor_key),
        cell(&actor.name),
        cell(&actor.actor_type),
        cell(&actor.profiled),
        cell(&actor.identifiers),
        cell(&actor.active),
        cell(&actor.apt),
        cell(&actor.allegiance),
        cell(&actor.origin),
        cell(&actor.targeted_sectors),
        cell(&actor.description),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflict_core::{Event, ThreatActor};

    fn create_test_rows() -> Vec<AttributedEvent> {
        vec![
            AttributedEvent::new(
                Event {
                    key: "E1".to_string(),
                    description: Some("Wiper, then \"ransom\" note".to_string()),
                    date_from: Some("2023-05-01T00:00:00Z".to_string()),
                    name: Some("Ransomware Attack".to_string()),
                    event_type: Some("Malware".to_string()),
                    country: Some("Ukraine".to_string()),
                    threat_actor_key: Some("TA1".to_string()),
                    ..Default::default()
                },
                ThreatActor {
                    key: "TA1".to_string(),
                    name: Some("Sandworm".to_string()),
                    allegiance: Some("Russian Federation".to_string()),
                    ..Default::default()
                },
            ),
            AttributedEvent::new(
                Event {
                    key: "E2".to_string(),
                    threat_actor_key: Some("TA2".to_string()),
                    ..Default::default()
                },
                ThreatActor {
                    key: "TA2".to_string(),
                    ..Default::default()
                },
            ),
        ]
    }

    #[test]
    fn test_export_csv() {
        let rows = create_test_rows();
        let exporter = Exporter::new(&rows);
        let csv = exporter.to_csv().unwrap();

        assert!(csv.starts_with(&CSV_HEADERS.join(",")));
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("\"Wiper, then \"\"ransom\"\" note\""));
    }

    #[test]
    fn test_csv_rows_have_header_width() {
        let rows = create_test_rows();
        let csv = Exporter::new(&rows).to_csv().unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        assert_eq!(reader.headers().unwrap().len(), CSV_HEADERS.len());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.len(), CSV_HEADERS.len());
        }
        assert_eq!(&records[0][0], "E1");
        assert_eq!(&records[0][8], "TA1");
        assert_eq!(&records[0][15], "Russian Federation");
        assert_eq!(&records[1][1], "");
    }

    #[test]
    fn test_export_empty_csv() {
        let csv = Exporter::new(&[]).to_csv().unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_export_json() {
        let rows = create_test_rows();
        let json = Exporter::new(&rows).to_json().unwrap();

        let parsed: Vec<AttributedEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rows);
        assert!(json.contains("\"threatActor\""));
    }

    #[test]
    fn test_export_text() {
        let rows = create_test_rows();
        let text = Exporter::new(&rows).to_text();

        assert!(text.starts_with("=== 2 attributed events ==="));
        assert!(text.contains("[E1] Ransomware Attack"));
        assert!(text.contains("threat actor: Sandworm (TA1), allegiance Russian Federation"));
        assert!(text.contains("[E2] (unnamed)"));
    }

    #[test]
    fn test_write_file() {
        let rows = create_test_rows();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        Exporter::new(&rows)
            .write_file(&path, ExportFormat::Csv)
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, Exporter::new(&rows).to_csv().unwrap());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::from_path("out/run.json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path("noext"), None);
    }
}
