//! The downloader seam and its reqwest-backed implementation.
//!
//! The concrete transport is an implementation detail behind the
//! [`Downloader`] trait: one method, fetch a URL into a destination file,
//! under a hard timeout.

use crate::error::{VoxError, VoxResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Fetches a remote artifact into a local file
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` into `dest`, enforcing `timeout` as a hard bound.
    ///
    /// On success `dest` holds the complete artifact; on failure no partial
    /// file is left at `dest`.
    async fn fetch(&self, url: &str, dest: &Path, timeout: Duration) -> VoxResult<()>;
}

/// HTTPS downloader on reqwest with rustls
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Create a downloader with a default client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str, dest: &Path, timeout: Duration) -> VoxResult<()> {
        tracing::info!(url, dest = %dest.display(), "fetching artifact");

        let partial = partial_path(dest);
        let result = tokio::time::timeout(timeout, self.fetch_inner(url, dest, &partial)).await;
        match result {
            Ok(inner) => inner,
            Err(elapsed) => {
                // Hard timeout: never hang the calling request
                remove_partial(&partial).await;
                Err(VoxError::download(format!(
                    "fetch of {url} timed out after {}s: {elapsed}",
                    timeout.as_secs()
                )))
            }
        }
    }
}

impl HttpDownloader {
    async fn fetch_inner(&self, url: &str, dest: &Path, partial: &Path) -> VoxResult<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VoxError::download(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(VoxError::download(format!(
                "fetch of {url} failed with status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VoxError::download(format!("read of {url} failed: {e}")))?;

        // Write to a sibling temp file and rename, so a crash mid-write
        // cannot leave a truncated artifact visible to discovery.
        if let Err(e) = tokio::fs::write(partial, &bytes).await {
            remove_partial(partial).await;
            return Err(VoxError::download(format!(
                "write of {} failed: {e}",
                partial.display()
            )));
        }
        tokio::fs::rename(partial, dest)
            .await
            .map_err(|e| VoxError::download(format!("rename into {} failed: {e}", dest.display())))
    }
}

// Each fetch gets its own temp file, so racing fetches for the same
// destination never interleave writes; whichever rename lands last wins.
static PART_SEQ: AtomicU64 = AtomicU64::new(0);

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(format!(".{}.part", PART_SEQ.fetch_add(1, Ordering::Relaxed)));
    PathBuf::from(name)
}

async fn remove_partial(partial: &Path) {
    if tokio::fs::remove_file(partial).await.is_ok() {
        tracing::debug!(path = %partial.display(), "removed partial download");
    }
}
