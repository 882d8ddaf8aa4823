//! Cross-reference table between TVDB/TMDB/IMDb and AniList ids.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::types::{MappingEntry, MappingError, RawMappingEntry, TmdbType};

/// In-memory cross-reference table. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn from_entries(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    /// Parse the JSON document, an object keyed by AniDB id.
    ///
    /// Rows with a non-numeric key or an unexpected shape are skipped.
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| MappingError::Parse(format!("anime ids table: {}", e)))?;

        let mut entries = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let Ok(anidb_id) = key.trim().parse::<u32>() else {
                warn!(key = %key, "Skipping mapping row with non-numeric AniDB id");
                continue;
            };
            match serde_json::from_value::<RawMappingEntry>(value) {
                Ok(row) => entries.push(row.into_entry(anidb_id)),
                Err(e) => warn!(anidb_id, error = %e, "Skipping malformed mapping row"),
            }
        }
        entries.sort_by_key(|e| e.anidb_id);

        debug!(rows = entries.len(), "Loaded anime ids table");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Find every row matching ANY of the supplied ids.
    ///
    /// Rows without an AniList id are dropped and the result is sorted by
    /// AniList id (then AniDB id). An empty result is not an error.
    pub fn resolve_tracking_ids(
        &self,
        tvdb_id: Option<i64>,
        tmdb_id: Option<i64>,
        imdb_id: Option<&str>,
        tmdb_type: TmdbType,
    ) -> Result<Vec<MappingEntry>, MappingError> {
        let imdb_id = imdb_id.map(str::trim).filter(|s| !s.is_empty());
        if tvdb_id.is_none() && tmdb_id.is_none() && imdb_id.is_none() {
            return Err(MappingError::InvalidQuery);
        }

        let mut matches: Vec<MappingEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                let tvdb_match = tvdb_id.is_some() && entry.tvdb_id == tvdb_id;
                let tmdb_match = tmdb_id.is_some()
                    && match tmdb_type {
                        TmdbType::Movie => entry.tmdb_movie_id == tmdb_id,
                        TmdbType::Show => entry.tmdb_show_id == tmdb_id,
                    };
                let imdb_match = imdb_id.is_some_and(|id| entry.has_imdb(id));
                tvdb_match || tmdb_match || imdb_match
            })
            .filter(|entry| entry.anilist_id.is_some())
            .cloned()
            .collect();

        matches.sort_by_key(|e| (e.anilist_id, e.anidb_id));
        Ok(matches)
    }

    /// Whether any row references this TVDB id.
    pub fn knows_tvdb(&self, tvdb_id: i64) -> bool {
        self.entries.iter().any(|e| e.tvdb_id == Some(tvdb_id))
    }

    /// Whether any row references this TMDB movie id.
    pub fn knows_tmdb_movie(&self, tmdb_id: i64) -> bool {
        self.entries.iter().any(|e| e.tmdb_movie_id == Some(tmdb_id))
    }

    /// Whether any row references this IMDb id.
    pub fn knows_imdb(&self, imdb_id: &str) -> bool {
        self.entries.iter().any(|e| e.has_imdb(imdb_id))
    }
}
