//! Types for the identifier mapping tables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or querying the mapping tables.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("at least one of tvdb_id, tmdb_id or imdb_id is required")]
    InvalidQuery,

    #[error("mapping document {url} unavailable and no cached copy exists: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("failed to parse mapping document: {0}")]
    Parse(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("mapping cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which TMDB namespace a `tmdb_id` query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TmdbType {
    Movie,
    Show,
}

/// One row of the cross-reference table, keyed by AniDB id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub anidb_id: u32,
    pub tvdb_id: Option<i64>,
    /// Target TVDB season; -1 means the whole main run without specials.
    pub tvdb_season: i32,
    /// Number of season episodes to skip before this entry starts.
    pub tvdb_epoffset: i32,
    pub tmdb_movie_id: Option<i64>,
    pub tmdb_show_id: Option<i64>,
    pub imdb_ids: Vec<String>,
    /// AniList id. Rows without one are never returned by lookups.
    pub anilist_id: Option<i64>,
}

impl MappingEntry {
    /// Create an entry with no external ids, season -1 and offset 0.
    pub fn new(anidb_id: u32) -> Self {
        Self {
            anidb_id,
            tvdb_id: None,
            tvdb_season: -1,
            tvdb_epoffset: 0,
            tmdb_movie_id: None,
            tmdb_show_id: None,
            imdb_ids: Vec::new(),
            anilist_id: None,
        }
    }

    pub fn has_imdb(&self, imdb_id: &str) -> bool {
        self.imdb_ids.iter().any(|i| i == imdb_id)
    }

    /// First IMDb id, if any.
    pub fn imdb_id(&self) -> Option<&str> {
        self.imdb_ids.first().map(String::as_str)
    }
}

/// Row shape of the upstream JSON document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMappingEntry {
    #[serde(default)]
    pub tvdb_id: Option<i64>,
    #[serde(default = "default_season")]
    pub tvdb_season: i32,
    #[serde(default)]
    pub tvdb_epoffset: i32,
    #[serde(default)]
    pub tmdb_movie_id: Option<i64>,
    #[serde(default)]
    pub tmdb_show_id: Option<i64>,
    /// May hold several comma-separated ids.
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub anilist_id: Option<i64>,
}

fn default_season() -> i32 {
    -1
}

impl RawMappingEntry {
    pub(crate) fn into_entry(self, anidb_id: u32) -> MappingEntry {
        let imdb_ids = self
            .imdb_id
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        MappingEntry {
            anidb_id,
            tvdb_id: self.tvdb_id,
            tvdb_season: self.tvdb_season,
            tvdb_epoffset: self.tvdb_epoffset,
            tmdb_movie_id: self.tmdb_movie_id,
            tmdb_show_id: self.tmdb_show_id,
            imdb_ids,
            anilist_id: self.anilist_id,
        }
    }
}
