use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, LibraryKind};
use crate::dispatch::PartialDispatch;
use crate::episodes::EpisodeWindowError;
use crate::library::LibraryError;
use crate::mapping::MappingError;
use crate::metrics;
use crate::release_index::ReleaseIndexError;
use crate::tracking::TrackingError;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identifier mappings unavailable: {0}")]
    Mapping(#[from] MappingError),

    #[error("Failed to list library: {0}")]
    Library(#[from] LibraryError),
}

/// Errors confined to one library item. Logged and recorded as failed.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    ReleaseIndex(#[from] ReleaseIndexError),

    #[error(transparent)]
    EpisodeWindow(#[from] EpisodeWindowError),

    #[error(transparent)]
    Dispatch(#[from] PartialDispatch),
}

impl ItemError {
    /// Torrents that went to the download client before the failure.
    pub fn torrents_added(&self) -> u32 {
        match self {
            ItemError::Dispatch(partial) => partial.report.added_count() as u32,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoMapping,
    NoIndexEntry,
    NoSuitableRelease,
    /// Special already present in the movie library.
    InMovieLibrary,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoMapping => "skipped_no_mapping",
            SkipReason::NoIndexEntry => "skipped_no_index_entry",
            SkipReason::NoSuitableRelease => "skipped_no_suitable_release",
            SkipReason::InMovieLibrary => "skipped_in_movie_library",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Local files already come from a recommended group.
    Matched,
    /// `would_add` counts groups reported instead of dispatched.
    Mismatched { added: u32, would_add: u32 },
    Skipped { reason: SkipReason },
    /// `added` counts torrents a dispatch batch added before it failed.
    Failed {
        error: String,
        #[serde(default)]
        added: u32,
    },
}

impl ItemOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        ItemOutcome::Skipped { reason }
    }

    pub fn failed(error: impl ToString) -> Self {
        ItemOutcome::Failed {
            error: error.to_string(),
            added: 0,
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Matched => "matched",
            ItemOutcome::Mismatched { .. } => "mismatched",
            ItemOutcome::Skipped { reason } => reason.as_str(),
            ItemOutcome::Failed { .. } => "failed",
        }
    }
}

impl From<ItemError> for ItemOutcome {
    fn from(error: ItemError) -> Self {
        ItemOutcome::Failed {
            added: error.torrents_added(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub title: String,
    pub tracking_id: Option<i64>,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
    pub recorded_at: DateTime<Utc>,
}

/// Result of one library run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRunSummary {
    pub library: LibraryKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Library items looked at (after pre-filtering).
    pub items_processed: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub torrents_added: u32,
    pub torrents_would_add: u32,
    /// The run stopped early at the torrent cap.
    pub cap_reached: bool,
    pub outcomes: Vec<OutcomeRecord>,
}

impl SyncRunSummary {
    pub fn new(library: LibraryKind) -> Self {
        Self {
            library,
            started_at: Utc::now(),
            finished_at: None,
            items_processed: 0,
            matched: 0,
            mismatched: 0,
            skipped: 0,
            failed: 0,
            torrents_added: 0,
            torrents_would_add: 0,
            cap_reached: false,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, title: &str, tracking_id: Option<i64>, outcome: ItemOutcome) {
        metrics::ITEMS_PROCESSED
            .with_label_values(&[self.library.as_str(), outcome.label()])
            .inc();

        match &outcome {
            ItemOutcome::Matched => self.matched += 1,
            ItemOutcome::Mismatched { added, would_add } => {
                self.mismatched += 1;
                self.torrents_added += added;
                self.torrents_would_add += would_add;
            }
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { added, .. } => {
                self.failed += 1;
                self.torrents_added += added;
            }
        }

        self.outcomes.push(OutcomeRecord {
            title: title.to_string(),
            tracking_id,
            outcome,
            recorded_at: Utc::now(),
        });
    }

    pub fn skipped_by(&self, reason: SkipReason) -> usize {
        self.outcomes
            .iter()
            .filter(|r| r.outcome == ItemOutcome::skipped(reason))
            .count()
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}
