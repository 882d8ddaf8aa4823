//! Types for best-release index entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when querying the release index.
#[derive(Debug, Error)]
pub enum ReleaseIndexError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Trackers the index treats as public. Anything else is private.
pub const PUBLIC_TRACKERS: &[&str] = &["Nyaa", "AnimeTosho", "AniDex", "RuTracker", "Other"];

/// Whether a tracker name is public (case-insensitive).
pub fn tracker_is_public(tracker: &str) -> bool {
    PUBLIC_TRACKERS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(tracker.trim()))
}

/// One tracker submission for an index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    /// May be empty when the group is unknown.
    pub release_group: String,
    pub tracker: String,
    /// Tracker page URL.
    pub url: String,
    pub infohash: String,
    pub is_public: bool,
    pub is_best: bool,
    pub is_dual_audio: bool,
}

impl ReleaseCandidate {
    /// Candidate with `is_public` derived from the tracker name and both
    /// curator flags cleared.
    pub fn new(release_group: &str, tracker: &str, url: &str, infohash: &str) -> Self {
        Self {
            release_group: release_group.to_string(),
            tracker: tracker.to_string(),
            url: url.to_string(),
            infohash: infohash.to_string(),
            is_public: tracker_is_public(tracker),
            is_best: false,
            is_dual_audio: false,
        }
    }

    pub fn best(mut self) -> Self {
        self.is_best = true;
        self
    }

    pub fn dual_audio(mut self) -> Self {
        self.is_dual_audio = true;
        self
    }
}

/// The index entry for one AniList id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseIndexEntry {
    pub tracking_id: i64,
    /// Public page for the entry.
    pub url: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub incomplete: bool,
    pub torrents: Vec<ReleaseCandidate>,
}
