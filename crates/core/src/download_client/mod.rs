//! Download client abstraction.
//!
//! The sync pipeline needs two capabilities: the set of info hashes the
//! client already has, and adding a torrent by URL.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;

use std::collections::HashSet;

use async_trait::async_trait;

#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Client name, for logs.
    fn name(&self) -> &str;

    /// Info hashes of every torrent in the client, lowercase.
    async fn list_active_hashes(&self) -> Result<HashSet<String>, DownloadClientError>;

    /// Add a torrent by URL. Anything but an explicit acknowledgement is
    /// `DownloadClientError::Rejected`.
    async fn add_url(&self, url: &str, category: Option<&str>) -> Result<(), DownloadClientError>;
}
