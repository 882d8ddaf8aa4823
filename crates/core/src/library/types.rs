//! Types for library manager (Sonarr / Radarr) data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to a library manager.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API key rejected (401).
    #[error("API key rejected by {0}")]
    Unauthorized(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Library state that cannot be reconciled (e.g. two files behind one movie).
    #[error("Data inconsistency: {0}")]
    DataInconsistency(String),
}

/// A series managed by Sonarr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub title: String,
    pub tvdb_id: Option<i64>,
    pub imdb_id: Option<String>,
}

/// A movie managed by Radarr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
}

/// One episode of a series as known to Sonarr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub season_number: i32,
    pub episode_number: i32,
    pub has_file: bool,
    /// Only present when `has_file` is true and Sonarr parsed a group.
    pub release_group: Option<String>,
}

impl Episode {
    pub fn missing(season_number: i32, episode_number: i32) -> Self {
        Self {
            season_number,
            episode_number,
            has_file: false,
            release_group: None,
        }
    }

    pub fn with_file(season_number: i32, episode_number: i32, release_group: &str) -> Self {
        Self {
            season_number,
            episode_number,
            has_file: true,
            release_group: Some(release_group.to_string()),
        }
    }
}
