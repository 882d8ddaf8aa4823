//! Dedupe-aware enqueue of recommended torrents.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::download_client::DownloadClient;
use crate::metrics;
use crate::selection::{tracker_allowed, RecommendedReleaseSet, RecommendedTorrent};

use super::resolver::TrackerResolvers;
use super::DispatchError;

/// Torrents added during one run, against an optional cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounter {
    added: u32,
    cap: Option<u32>,
}

impl RunCounter {
    pub fn new(cap: Option<u32>) -> Self {
        Self { added: 0, cap }
    }

    pub fn added(&self) -> u32 {
        self.added
    }

    pub fn cap(&self) -> Option<u32> {
        self.cap
    }

    pub fn record_added(&mut self, n: u32) {
        self.added = self.added.saturating_add(n);
    }

    pub fn cap_reached(&self) -> bool {
        self.cap.is_some_and(|cap| self.added >= cap)
    }
}

/// A torrent handled by `dispatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedTorrent {
    pub group: String,
    pub tracker: String,
    pub page_url: String,
    pub hash: String,
}

/// What one `dispatch` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub added: Vec<DispatchedTorrent>,
    pub already_present: Vec<DispatchedTorrent>,
    /// Stopped early because the run cap was hit.
    pub cap_reached: bool,
}

impl DispatchReport {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }
}

/// A batch stopped by `error` after adding the torrents in `report`.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PartialDispatch {
    pub report: DispatchReport,
    #[source]
    pub error: DispatchError,
}

/// Sends recommended torrents to the download client.
pub struct Dispatcher {
    client: Arc<dyn DownloadClient>,
    resolvers: TrackerResolvers,
    category: Option<String>,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn DownloadClient>,
        resolvers: TrackerResolvers,
        category: Option<String>,
    ) -> Self {
        Self {
            client,
            resolvers,
            category,
        }
    }

    /// Add every torrent of `recommendation` the client does not have yet.
    ///
    /// Torrents on trackers outside `allowed_trackers` are skipped. The
    /// first unsupported tracker, failed resolution or rejected add aborts
    /// the batch; the error carries the report of what was added before it.
    /// Returns as soon as `counter` reaches its cap.
    pub async fn dispatch(
        &self,
        recommendation: &RecommendedReleaseSet,
        allowed_trackers: &[String],
        counter: &mut RunCounter,
    ) -> Result<DispatchReport, PartialDispatch> {
        let mut report = DispatchReport::default();

        if counter.cap_reached() {
            report.cap_reached = true;
            return Ok(report);
        }

        for (group, torrent) in recommendation.torrents() {
            if !tracker_allowed(allowed_trackers, &torrent.tracker) {
                debug!(tracker = %torrent.tracker, url = %torrent.url, "Skipping torrent on tracker outside allow-list");
                continue;
            }

            let added = match self.dispatch_one(group, torrent, &mut report).await {
                Ok(added) => added,
                Err(error) => {
                    metrics::DISPATCH_FAILURES
                        .with_label_values(&[error.reason()])
                        .inc();
                    return Err(PartialDispatch { report, error });
                }
            };

            if added {
                counter.record_added(1);
                if counter.cap_reached() {
                    info!(
                        added = counter.added(),
                        cap = ?counter.cap(),
                        "Reached maximum number of torrents to add"
                    );
                    report.cap_reached = true;
                    return Ok(report);
                }
            }
        }

        Ok(report)
    }

    /// Returns whether the torrent was added.
    async fn dispatch_one(
        &self,
        group: &str,
        torrent: &RecommendedTorrent,
        report: &mut DispatchReport,
    ) -> Result<bool, DispatchError> {
        let resolver = self
            .resolvers
            .get(&torrent.tracker)
            .ok_or_else(|| DispatchError::UnsupportedTracker(torrent.tracker.clone()))?;

        let record = DispatchedTorrent {
            group: group.to_string(),
            tracker: torrent.tracker.clone(),
            page_url: torrent.url.clone(),
            hash: torrent.hash.to_lowercase(),
        };

        let active = self.client.list_active_hashes().await?;
        if !record.hash.is_empty() && active.contains(&record.hash) {
            debug!(url = %torrent.url, hash = %record.hash, "Torrent already in {}", self.client.name());
            metrics::TORRENTS_ALREADY_PRESENT.inc();
            report.already_present.push(record);
            return Ok(false);
        }

        let torrent_url = resolver.resolve(&torrent.url).await?;
        self.client
            .add_url(&torrent_url, self.category.as_deref())
            .await?;

        info!(group = %group, url = %torrent_url, "Added torrent to {}", self.client.name());
        metrics::TORRENTS_ADDED.inc();
        report.added.push(record);
        Ok(true)
    }
}
