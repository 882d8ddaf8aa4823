//! On-disk cache for the remote mapping documents.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use reqwest::Client;
use tracing::{debug, info, warn};

use super::types::MappingError;

const SECS_PER_DAY: u64 = 86_400;

/// Downloads mapping documents into a cache directory and reuses them until
/// they are `cache_days` old.
pub struct MappingCache {
    client: Client,
    cache_dir: PathBuf,
    cache_days: u32,
}

impl MappingCache {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        cache_days: u32,
        timeout: Duration,
    ) -> Result<Self, MappingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MappingError::Client(e.to_string()))?;

        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
            cache_days,
        })
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.cache_dir.join(file_name)
    }

    /// Return the document contents, downloading it first when the cached
    /// copy is missing or expired.
    ///
    /// A failed download falls back to the stale copy when there is one.
    pub async fn fetch(&self, url: &str, file_name: &str) -> Result<String, MappingError> {
        let path = self.path_for(file_name);

        let cached_age = file_age(&path).await;
        if let Some(age) = cached_age {
            if !is_expired(age, self.cache_days) {
                debug!(path = %path.display(), "Using cached mapping document");
                return Ok(tokio::fs::read_to_string(&path).await?);
            }
        }

        match self.download(url).await {
            Ok(body) => {
                if let Err(e) = store(&path, &body).await {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to write mapping cache, using downloaded copy"
                    );
                }
                Ok(body)
            }
            Err(reason) if cached_age.is_some() => {
                warn!(
                    url = %url,
                    error = %reason,
                    "Mapping download failed, reusing stale cache"
                );
                Ok(tokio::fs::read_to_string(&path).await?)
            }
            Err(reason) => Err(MappingError::Unavailable {
                url: url.to_string(),
                reason,
            }),
        }
    }

    async fn download(&self, url: &str) -> Result<String, String> {
        info!(url = %url, "Downloading mapping document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        response.text().await.map_err(|e| e.to_string())
    }
}

/// Write `body` to `path` through a temporary file.
async fn store(path: &Path, body: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, body.as_bytes()).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Age of a file by mtime, or `None` if it does not exist.
async fn file_age(path: &Path) -> Option<Duration> {
    let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}

/// Whole days count, so a one-day cache expires 24h after download.
fn is_expired(age: Duration, cache_days: u32) -> bool {
    age.as_secs() / SECS_PER_DAY >= u64::from(cache_days)
}
