//! Mock release index for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::release_index::{ReleaseIndex, ReleaseIndexEntry, ReleaseIndexError};

/// In-memory release index keyed by tracking id.
#[derive(Debug, Default)]
pub struct MockReleaseIndex {
    entries: Arc<RwLock<HashMap<i64, ReleaseIndexEntry>>>,
    /// Tracking ids queried, in order.
    queries: Arc<RwLock<Vec<i64>>>,
    next_error: Arc<RwLock<Option<ReleaseIndexError>>>,
}

impl MockReleaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entry: ReleaseIndexEntry) {
        self.entries.write().await.insert(entry.tracking_id, entry);
    }

    pub async fn queries(&self) -> Vec<i64> {
        self.queries.read().await.clone()
    }

    pub async fn set_next_error(&self, error: ReleaseIndexError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl ReleaseIndex for MockReleaseIndex {
    async fn get_entry(
        &self,
        tracking_id: i64,
    ) -> Result<Option<ReleaseIndexEntry>, ReleaseIndexError> {
        self.queries.write().await.push(tracking_id);
        if let Some(e) = self.next_error.write().await.take() {
            return Err(e);
        }
        Ok(self.entries.read().await.get(&tracking_id).cloned())
    }
}
