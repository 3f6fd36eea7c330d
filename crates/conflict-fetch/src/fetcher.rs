//! Blocking client for the impacts endpoint

use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Impacts endpoint of the CyberPeace Institute cyber-conflicts platform.
pub const DEFAULT_URL: &str = "https://cyberconflicts.cyberpeaceinstitute.org/api/impacts";

/// Fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Endpoint URL
    #[serde(default = "default_url")]
    pub url: String,
    /// Static request headers
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
    /// Directory the dated JSON file is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_headers() -> BTreeMap<String, String> {
    [
        (
            "User-Agent",
            "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/118.0",
        ),
        ("Accept", "*/*"),
        ("Accept-Language", "en-US,en;q=0.5"),
        (
            "Referer",
            "https://cyberconflicts.cyberpeaceinstitute.org/threats/attack-details",
        ),
        ("Content-Type", "application/json"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            headers: default_headers(),
            output_dir: default_output_dir(),
        }
    }
}

/// Downloads the impacts feed
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
}

impl Fetcher {
    /// Create a fetcher; fails on malformed headers.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(header_map(&config.headers)?)
            .build()?;
        Ok(Self { config, client })
    }

    /// The active configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET the endpoint and parse the body as JSON.
    pub fn fetch(&self) -> Result<Value> {
        let response = self.client.get(&self.config.url).send()?;
        check_status(response.status().as_u16())?;
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch and save to `data_YYYY-MM-DD.json` (local date) in the output
    /// directory. Returns the written path.
    pub fn fetch_to_file(&self) -> Result<PathBuf> {
        let data = self.fetch()?;
        let path = save_pretty(&data, &self.config.output_dir, Local::now().date_naive())?;
        info!(path = %path.display(), "data fetched and saved");
        Ok(path)
    }

    /// Like [`Fetcher::fetch_to_file`], but a non-200 answer is logged and
    /// reported as `Ok(None)`. Transport, decoding and file errors are
    /// returned.
    pub fn fetch_or_none(&self) -> Result<Option<PathBuf>> {
        match self.fetch_to_file() {
            Ok(path) => Ok(Some(path)),
            Err(Error::Status(status)) => {
                warn!(url = %self.config.url, status, "fetch failed");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// File name for a download made on `date`.
pub fn dated_file_name(date: NaiveDate) -> String {
    format!("data_{}.json", date.format("%Y-%m-%d"))
}

fn check_status(status: u16) -> Result<()> {
    if status == 200 {
        Ok(())
    } else {
        Err(Error::Status(status))
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let invalid = |reason: String| Error::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn save_pretty(data: &Value, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(dated_file_name(date));

    let mut writer = BufWriter::new(File::create(&path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    data.serialize(&mut serializer)?;
    writer.flush()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a local port.
    fn serve_once(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/api/impacts", addr)
    }

    fn local_config(url: String, dir: &Path) -> FetchConfig {
        FetchConfig {
            url,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.headers.get("Accept").map(String::as_str), Some("*/*"));
        assert!(config.headers.contains_key("User-Agent"));
        assert!(header_map(&config.headers).is_ok());
    }

    #[test]
    fn test_config_from_ron() {
        let config: FetchConfig =
            ron::from_str(r#"(url: "http://localhost:8000/impacts")"#).unwrap();
        assert_eq!(config.url, "http://localhost:8000/impacts");
        assert_eq!(config.headers, default_headers());
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_invalid_header() {
        let mut headers = BTreeMap::new();
        headers.insert("Bad Header".to_string(), "x".to_string());
        let err = header_map(&headers).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(200).is_ok());
        let err = check_status(204).unwrap_err();
        assert!(matches!(err, Error::Status(204)));
        assert_eq!(err.to_string(), "Failed to fetch data. Status code: 204");
    }

    #[test]
    fn test_dated_file_name() {
        let date = NaiveDate::from_ymd_opt(2023, 10, 11).unwrap();
        assert_eq!(dated_file_name(date), "data_2023-10-11.json");
    }

    #[test]
    fn test_save_pretty() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 10, 11).unwrap();
        let data = serde_json::json!([{ "event": { "_key": "E1" } }]);

        let path = save_pretty(&data, dir.path(), date).unwrap();
        assert_eq!(path, dir.path().join("data_2023-10-11.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n    {"));
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_fetch_ok() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once("200 OK", r#"[{"event":{"_key":"E1"}}]"#);
        let fetcher = Fetcher::new(local_config(url, dir.path())).unwrap();

        let path = fetcher.fetch_to_file().unwrap();
        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written[0]["event"]["_key"], "E1");
    }

    #[test]
    fn test_fetch_non_200() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once("403 Forbidden", "{}");
        let fetcher = Fetcher::new(local_config(url, dir.path())).unwrap();

        let err = fetcher.fetch().unwrap_err();
        assert!(matches!(err, Error::Status(403)));
    }

    #[test]
    fn test_fetch_or_none() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once("500 Internal Server Error", "{}");
        let fetcher = Fetcher::new(local_config(url, dir.path())).unwrap();

        assert!(fetcher.fetch_or_none().unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_fetch_or_none_keeps_other_errors() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once("200 OK", "not json");
        let fetcher = Fetcher::new(local_config(url, dir.path())).unwrap();

        let err = fetcher.fetch_or_none().unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
