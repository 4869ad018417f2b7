//! Catalog and package download
//!
//! Single-shot HTTP transfers with a whole-request timeout. Failures are
//! reported as `UpdateError::Network` and never retried.

use anyhow::{Context, Result};
use biosup_core::UpdateError;
use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::HttpConfig;

/// Join a catalog-relative path onto the base URL
///
/// Absolute URLs are returned unchanged.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let path = path.replace('\\', "/");
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// HTTP document fetcher
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, UpdateError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::network(url, e))?;

        if !response.status().is_success() {
            return Err(UpdateError::network(
                url,
                format!("HTTP status {}", response.status()),
            ));
        }
        Ok(response)
    }

    /// Fetch a whole document into memory
    pub async fn fetch_document(&self, url: &str) -> Result<Vec<u8>, UpdateError> {
        debug!(url = %url, "Fetching document");
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpdateError::network(url, e))?;
        info!(url = %url, size = bytes.len(), "Fetched document");
        Ok(bytes.to_vec())
    }

    /// Stream a package to `dest`, returning the number of bytes written
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        info!(url = %url, dest = %dest.display(), "Downloading package");
        let response = self.get(url).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| UpdateError::network(url, e))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(dest = %dest.display(), size = written, "Package downloaded");
        Ok(written)
    }
}
