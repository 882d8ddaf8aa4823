use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::SyncConfig;
use crate::dispatch::{Dispatcher, RunCounter};
use crate::notify::Notifier;
use crate::release_index::ReleaseIndex;
use crate::selection::{AutoSelection, SelectionPreferences, SelectionStrategy};
use crate::tracking::{MediaInfo, TrackingError, TrackingService};

/// Per-run state and collaborators shared by every pipeline stage.
///
/// Created at run start and dropped at run end. The media cache and the
/// torrent counter never outlive it.
pub struct RunContext {
    pub preferences: SelectionPreferences,
    pub counter: RunCounter,
    pub sleep_time: Duration,
    pub ignore_movies_in_movie_library: bool,
    pub dry_run: bool,
    pub(crate) tracking: Arc<dyn TrackingService>,
    pub(crate) release_index: Arc<dyn ReleaseIndex>,
    pub(crate) strategy: Arc<dyn SelectionStrategy>,
    pub(crate) dispatcher: Option<Dispatcher>,
    pub(crate) notifier: Option<Arc<dyn Notifier>>,
    media_cache: HashMap<i64, MediaInfo>,
}

impl RunContext {
    pub fn new(
        config: &SyncConfig,
        tracking: Arc<dyn TrackingService>,
        release_index: Arc<dyn ReleaseIndex>,
    ) -> Self {
        Self {
            preferences: SelectionPreferences::from(config),
            counter: RunCounter::new(config.max_torrents_to_add),
            sleep_time: Duration::try_from_secs_f64(config.sleep_time_secs).unwrap_or_default(),
            ignore_movies_in_movie_library: config.ignore_movies_in_movie_library,
            dry_run: config.dry_run,
            tracking,
            release_index,
            strategy: Arc::new(AutoSelection),
            dispatcher: None,
            notifier: None,
            media_cache: HashMap::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn SelectionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Whether mismatches go to the download client.
    pub fn dispatches(&self) -> bool {
        self.dispatcher.is_some() && !self.dry_run
    }

    /// Tracking-service metadata, fetched once per id per run.
    pub async fn media(&mut self, id: i64) -> Result<MediaInfo, TrackingError> {
        if let Some(info) = self.media_cache.get(&id) {
            return Ok(info.clone());
        }

        debug!(tracking_id = id, "Fetching tracking-service metadata");
        let info = self.tracking.get_media(id).await?;
        self.media_cache.insert(id, info.clone());
        Ok(info)
    }

    pub(crate) async fn pause(&self) {
        if !self.sleep_time.is_zero() {
            tokio::time::sleep(self.sleep_time).await;
        }
    }
}
