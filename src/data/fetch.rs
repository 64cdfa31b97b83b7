//! Raw dataset retrieval.
//!
//! The cache only sees the [`Fetch`] trait, so tests can hand it a closure
//! instead of touching the network.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// CDC PLACES county dataset, CSV download endpoint.
pub const PLACES_COUNTY_CSV: &str =
    "https://data.cdc.gov/api/views/swc5-untb/rows.csv?accessType=DOWNLOAD";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Supplies raw CSV bytes.
pub trait Fetch {
    fn fetch(&self) -> Result<Vec<u8>, FetchError>;

    /// Where the bytes come from, for log lines.
    fn describe(&self) -> String {
        "custom source".to_string()
    }
}

impl<F> Fetch for F
where
    F: Fn() -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        self()
    }
}

/// Downloads the export over HTTP(S).
pub struct HttpFetcher {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        info!(url = %self.url, "downloading dataset");
        let http_err = |source: reqwest::Error| FetchError::Http {
            url: self.url.clone(),
            source,
        };

        let bytes = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?
            .bytes()
            .map_err(http_err)?;

        info!(bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads a previously downloaded export from disk.
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Fetch for FileFetcher {
    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        std::fs::read(&self.path).map_err(|source| FetchError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn closures_are_fetchers() {
        let fetcher = || Ok::<_, FetchError>(b"a,b\n1,2\n".to_vec());
        assert_eq!(fetcher.fetch().unwrap(), b"a,b\n1,2\n");
        assert_eq!(fetcher.describe(), "custom source");
    }

    #[test]
    fn file_fetcher_reads_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"StateAbbr\nPA\n").unwrap();

        let fetcher = FileFetcher::new(file.path());
        assert_eq!(fetcher.fetch().unwrap(), b"StateAbbr\nPA\n");
    }

    #[test]
    fn file_fetcher_missing_path_is_io_error() {
        let fetcher = FileFetcher::new("/nonexistent/rows.csv");
        assert!(matches!(fetcher.fetch(), Err(FetchError::Io { .. })));
    }
}
