//! Tools for fetching data from the provider.
//!
//! The pipeline only talks to the network through the [`Http`] trait, so
//! tests and alternative transports can stand in for [`Fetcher`], the
//! reqwest implementation.

use crate::error::{Error, Result};
use crate::utils::file_system;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

pub mod metadata;
pub mod thumbnail;

/// The user agent sent with every request.
const BROWSER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// How long a status probe may wait for a connection.
pub const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// The network operations the pipeline needs.
#[async_trait]
pub trait Http: Send + Sync {
    /// Returns the status code of `url` without fetching its body.
    async fn status(&self, url: &str) -> Result<u16>;

    /// Fetches `url` and returns its body as text.
    async fn get_text(&self, url: &str) -> Result<String>;

    /// Streams `url` into `destination`, creating the file if needed and
    /// truncating it otherwise.
    async fn get_to_file(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Whether a status code reports success.
pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

/// The fetcher is responsible for downloading data from a URL.
#[derive(Clone, Debug)]
pub struct Fetcher {
    /// Used for bodies; no timeout, downloads run until done.
    client: reqwest::Client,
    /// Used for status probes, with a short connect timeout.
    probe: reqwest::Client,
    referer: String,
}

impl fmt::Display for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fetcher(referer={})", self.referer)
    }
}

impl Fetcher {
    /// Creates a new fetcher that presents itself as a browser coming from `referer`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP clients could not be built.
    pub fn new(referer: impl AsRef<str>) -> Result<Self> {
        let referer = referer.as_ref().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        let value = HeaderValue::from_str(&referer).map_err(|e| {
            Error::InvalidConfiguration(format!("invalid referer '{}': {}", referer, e))
        })?;
        headers.insert(REFERER, value);

        let client = reqwest::Client::builder()
            .default_headers(headers.clone())
            .build()?;
        let probe = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(PROBE_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            probe,
            referer,
        })
    }
}

#[async_trait]
impl Http for Fetcher {
    async fn status(&self, url: &str) -> Result<u16> {
        log::debug!("Probing {}", url);

        let response = self.probe.head(url).send().await?;
        Ok(response.status().as_u16())
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        log::debug!("Fetching text from {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn get_to_file(&self, url: &str, destination: &Path) -> Result<()> {
        log::debug!("Fetching asset from {} to {:?}", url, destination);

        let response = self.client.get(url).send().await?.error_for_status()?;

        file_system::create_parent_dir(destination)?;
        let mut dest = file_system::create_file(destination).await?;

        let mut stream = response.bytes_stream();

        // Write in 1 MB batches rather than per chunk
        let mut buffer = Vec::with_capacity(1024 * 1024);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);

            if buffer.len() >= 1024 * 1024 {
                dest.write_all(&buffer).await?;
                written += buffer.len() as u64;
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            dest.write_all(&buffer).await?;
            written += buffer.len() as u64;
        }
        dest.flush().await?;

        log::debug!("Wrote {} bytes to {:?}", written, destination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(301));
        assert!(!is_success(404));
        assert!(!is_success(0));
    }

    #[test]
    fn test_fetcher_rejects_invalid_referer() {
        assert!(matches!(
            Fetcher::new("bad\nreferer"),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_fetcher_display() {
        let fetcher = Fetcher::new("https://www.youtube.com/").unwrap();
        assert_eq!(fetcher.to_string(), "Fetcher(referer=https://www.youtube.com/)");
    }
}
