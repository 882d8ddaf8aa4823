//! Mock tracking service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tracking::{MediaInfo, TrackingError, TrackingService};

/// In-memory tracking service. Unknown ids are `NotFound`.
#[derive(Debug, Default)]
pub struct MockTrackingService {
    media: Arc<RwLock<HashMap<i64, MediaInfo>>>,
    /// Number of `get_media` calls per id.
    calls: Arc<RwLock<HashMap<i64, usize>>>,
}

impl MockTrackingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, media: MediaInfo) {
        self.media.write().await.insert(media.id, media);
    }

    pub async fn calls_for(&self, id: i64) -> usize {
        self.calls.read().await.get(&id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TrackingService for MockTrackingService {
    async fn get_media(&self, id: i64) -> Result<MediaInfo, TrackingError> {
        *self.calls.write().await.entry(id).or_insert(0) += 1;
        self.media
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TrackingError::NotFound(id))
    }
}
