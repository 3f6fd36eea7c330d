//! RON configuration for the `conflict` binary

use conflict_db::ConflictPolicy;
use conflict_fetch::FetchConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "conflict.ron";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Store file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Treatment of already-stored keys during ingestion
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    /// Download settings
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Log filter directives; `RUST_LOG` takes precedence
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("events.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            conflict_policy: ConflictPolicy::default(),
            fetch: FetchConfig::default(),
            log_filter: None,
        }
    }
}

impl Config {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from RON text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load an explicit config file, else `conflict.ron` if present, else
    /// the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("()").unwrap();
        assert_eq!(config.database_path, PathBuf::from("events.db"));
        assert_eq!(config.conflict_policy, ConflictPolicy::Skip);
        assert_eq!(config.fetch.url, conflict_fetch::DEFAULT_URL);
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"(
                database_path: "/var/lib/conflict/events.db",
                conflict_policy: Replace,
                fetch: (
                    url: "http://localhost:8000/api/impacts",
                    headers: { "Accept": "application/json" },
                    output_dir: "downloads",
                ),
                log_filter: Some("conflict_db=debug"),
            )"#,
        )
        .unwrap();

        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/conflict/events.db")
        );
        assert_eq!(config.conflict_policy, ConflictPolicy::Replace);
        assert_eq!(config.fetch.headers.len(), 1);
        assert_eq!(config.fetch.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.log_filter.as_deref(), Some("conflict_db=debug"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ron");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io(_))));

        let broken = dir.path().join("broken.ron");
        fs::write(&broken, "(database_path: 42)").unwrap();
        assert!(matches!(Config::load(&broken), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conflict.ron");
        fs::write(&path, r#"(database_path: "other.db")"#).unwrap();

        let config = Config::resolve(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("other.db"));
    }
}
