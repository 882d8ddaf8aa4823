//! Tracking service (AniList) metadata lookup.

mod anilist;

pub use anilist::AniListClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when querying the tracking service.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// No media with this id.
    #[error("Media not found: {0}")]
    NotFound(i64),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// What the sync pipeline needs to know about an AniList entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: i64,
    pub title: String,
    /// AniList format (TV, TV_SHORT, MOVIE, OVA, ONA, SPECIAL, ...).
    pub format: Option<String>,
    /// Episode count, unknown for ongoing shows.
    pub episodes: Option<u32>,
    pub thumbnail_url: Option<String>,
    pub site_url: Option<String>,
}

impl MediaInfo {
    pub fn new(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            format: None,
            episodes: None,
            thumbnail_url: None,
            site_url: None,
        }
    }
}

#[async_trait]
pub trait TrackingService: Send + Sync {
    async fn get_media(&self, id: i64) -> Result<MediaInfo, TrackingError>;
}
