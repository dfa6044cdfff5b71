// 🌐 Document Sources - Where pages and rate sheets come from
// One trait, so stages never care whether the bytes came over HTTP or disk.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::fs;
use std::time::Duration;

/// Fetches a whole text document by URL
pub trait DocumentSource: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP GET; `file://` URLs are read from the local filesystem
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("banks-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpSource { client })
    }
}

impl DocumentSource for HttpSource {
    fn fetch_text(&self, url: &str) -> Result<String> {
        if let Some(path) = url.strip_prefix("file://") {
            return fs::read_to_string(path).with_context(|| format!("Failed to read {}", path));
        }

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("unsupported URL scheme: {}", url);
        }

        tracing::debug!("GET {}", url);
        let body = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad response from {}", url))?
            .text()
            .with_context(|| format!("Failed to read body of {}", url))?;

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source() -> HttpSource {
        HttpSource::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_file_url_reads_local_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<html></html>").unwrap();

        let url = format!("file://{}", path.display());
        assert_eq!(source().fetch_text(&url).unwrap(), "<html></html>");
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let url = format!("file://{}", dir.path().join("nope.html").display());

        let err = source().fetch_text(&url).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read"));
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(source().fetch_text("ftp://example.com/page").is_err());
    }
}
