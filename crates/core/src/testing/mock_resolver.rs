//! Mock tracker URL resolver for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::dispatch::{DispatchError, TorrentUrlResolver};

/// Resolves `<page>` to `<page>.torrent` without network access.
#[derive(Debug)]
pub struct MockTorrentUrlResolver {
    tracker: String,
    /// Page URLs whose resolution fails.
    failing: Arc<RwLock<HashSet<String>>>,
    /// Page URLs resolved, in order.
    resolved: Arc<RwLock<Vec<String>>>,
}

impl MockTorrentUrlResolver {
    pub fn new(tracker: &str) -> Self {
        Self {
            tracker: tracker.to_string(),
            failing: Arc::new(RwLock::new(HashSet::new())),
            resolved: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn fail_for(&self, page_url: &str) {
        self.failing.write().await.insert(page_url.to_string());
    }

    pub async fn resolved(&self) -> Vec<String> {
        self.resolved.read().await.clone()
    }
}

#[async_trait]
impl TorrentUrlResolver for MockTorrentUrlResolver {
    fn tracker(&self) -> &str {
        &self.tracker
    }

    async fn resolve(&self, page_url: &str) -> Result<String, DispatchError> {
        self.resolved.write().await.push(page_url.to_string());
        if self.failing.read().await.contains(page_url) {
            return Err(DispatchError::Resolution {
                url: page_url.to_string(),
                reason: "mock resolution failure".to_string(),
            });
        }
        Ok(format!("{}.torrent", page_url))
    }
}
