//! Artifact fetching
//!
//! The modeler pulls external documents through the [`ArtifactFetcher`] seam.
//! [`HttpFetcher`] serves `http`/`https` URLs over the network and `file`
//! URLs from the local filesystem; [`StaticFetcher`] serves preloaded entries
//! from memory and never touches the network.

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use url::Url;

use crate::config::FetchSettings;
use crate::error::{ModelerError, Result};

/// Pulls the bytes of an external document
pub trait ArtifactFetcher {
    /// Fetch the document at `url`
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Fetcher backed by a blocking HTTP client
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a fetcher from the configured timeout and user agent
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        match url.scheme() {
            "http" | "https" => {
                let response = self.client.get(url.clone()).send()?.error_for_status()?;
                Ok(response.bytes()?.to_vec())
            }
            "file" => {
                let path = url.to_file_path().map_err(|_| ModelerError::UnsupportedScheme {
                    scheme: "file".to_string(),
                    url: url.to_string(),
                })?;
                Ok(fs::read(path)?)
            }
            other => Err(ModelerError::UnsupportedScheme {
                scheme: other.to_string(),
                url: url.to_string(),
            }),
        }
    }
}

/// Fetcher serving preloaded entries from memory
///
/// Entries are keyed by the serialized URL form. Useful for offline runs and
/// deterministic tests.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    entries: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    /// Create an empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes served for a URL
    pub fn insert(&mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(url.into(), bytes.into());
    }
}

impl ArtifactFetcher for StaticFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        self.entries
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ModelerError::FetchEntryMissing(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_static_fetcher_hit_and_miss() {
        let mut fetcher = StaticFetcher::new();
        fetcher.insert("http://example.test/schemas/Foo.xsd", b"<schema/>".to_vec());

        let hit = Url::parse("http://example.test/schemas/Foo.xsd").unwrap();
        assert_eq!(fetcher.fetch(&hit).unwrap(), b"<schema/>");

        let miss = Url::parse("http://example.test/schemas/Bar.xsd").unwrap();
        assert!(matches!(fetcher.fetch(&miss), Err(ModelerError::FetchEntryMissing(_))));
    }

    #[test]
    fn test_http_fetcher_reads_file_urls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<schema/>").unwrap();

        let fetcher = HttpFetcher::new(&FetchSettings::default()).unwrap();
        let url = Url::from_file_path(file.path()).unwrap();
        assert_eq!(fetcher.fetch(&url).unwrap(), b"<schema/>");
    }

    #[test]
    fn test_http_fetcher_rejects_unknown_schemes() {
        let fetcher = HttpFetcher::new(&FetchSettings::default()).unwrap();
        let url = Url::parse("ftp://example.test/Foo.xsd").unwrap();
        assert!(matches!(fetcher.fetch(&url), Err(ModelerError::UnsupportedScheme { .. })));
    }
}
