//! Torrent dispatch: resolve recommended tracker pages and enqueue them in
//! the download client, skipping anything it already has.

mod dispatcher;
mod resolver;

pub use dispatcher::{DispatchReport, DispatchedTorrent, Dispatcher, PartialDispatch, RunCounter};
pub use resolver::{
    parse_animetosho_page, parse_nyaa_page, AnimeToshoResolver, NyaaResolver, TorrentUrlResolver,
    TrackerResolvers,
};

use thiserror::Error;

use crate::download_client::DownloadClientError;

/// Errors that abort a dispatch batch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unsupported tracker: {0}")]
    UnsupportedTracker(String),

    #[error("Failed to resolve torrent from {url}: {reason}")]
    Resolution { url: String, reason: String },

    #[error("Download client error: {0}")]
    Client(#[from] DownloadClientError),
}

impl DispatchError {
    pub(crate) fn resolution(url: &str, reason: impl Into<String>) -> Self {
        DispatchError::Resolution {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::UnsupportedTracker(_) => "unsupported_tracker",
            DispatchError::Resolution { .. } => "resolution",
            DispatchError::Client(_) => "client",
        }
    }
}
