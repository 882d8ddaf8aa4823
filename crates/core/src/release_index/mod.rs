//! Best-release index lookup.

mod releases_moe;
mod types;

pub use releases_moe::ReleasesMoeClient;
pub use types::*;

use async_trait::async_trait;

/// Source of curated best-release entries, keyed by AniList id.
#[async_trait]
pub trait ReleaseIndex: Send + Sync {
    /// Entry for an AniList id, or `None` if the index has none.
    async fn get_entry(
        &self,
        tracking_id: i64,
    ) -> Result<Option<ReleaseIndexEntry>, ReleaseIndexError>;
}
