//! Mock download client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::download_client::{DownloadClient, DownloadClientError};

/// A recorded `add_url` call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAddUrl {
    pub url: String,
    pub category: Option<String>,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the DownloadClient trait.
///
/// Provides controllable behavior for testing:
/// - Preload the info hashes the client "already has"
/// - Track added URLs for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockDownloadClient::new();
/// client.add_hash("abc123").await;
///
/// dispatcher.dispatch(&set, &trackers, &mut counter).await?;
///
/// let added = client.added_urls().await;
/// assert_eq!(added.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockDownloadClient {
    /// Hashes reported by `list_active_hashes`.
    hashes: Arc<RwLock<HashSet<String>>>,
    /// Recorded add_url calls.
    added: Arc<RwLock<Vec<RecordedAddUrl>>>,
    /// Number of `list_active_hashes` calls.
    list_calls: Arc<RwLock<usize>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<DownloadClientError>>>,
}

impl MockDownloadClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a hash as already present (stored lowercase).
    pub async fn add_hash(&self, hash: &str) {
        self.hashes.write().await.insert(hash.to_lowercase());
    }

    pub async fn added(&self) -> Vec<RecordedAddUrl> {
        self.added.read().await.clone()
    }

    pub async fn added_urls(&self) -> Vec<String> {
        self.added
            .read()
            .await
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    pub async fn list_calls(&self) -> usize {
        *self.list_calls.read().await
    }

    /// Make the next operation fail.
    pub async fn set_next_error(&self, error: DownloadClientError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<DownloadClientError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl DownloadClient for MockDownloadClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_active_hashes(&self) -> Result<HashSet<String>, DownloadClientError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        *self.list_calls.write().await += 1;
        Ok(self.hashes.read().await.clone())
    }

    async fn add_url(&self, url: &str, category: Option<&str>) -> Result<(), DownloadClientError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        self.added.write().await.push(RecordedAddUrl {
            url: url.to_string(),
            category: category.map(str::to_string),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}
