//! Identifier mapping resolver.
//!
//! Two community documents are combined here:
//! - the anime ids table, linking AniDB ids to TVDB/TMDB/IMDb and AniList
//!   ids plus a season/offset hint
//! - the AniDB episode override list, used when offset arithmetic is not
//!   enough (specials, OVAs, movies)
//!
//! Both are cached on disk and loaded once per run.

mod anidb;
mod cache;
mod table;
mod types;

use std::time::Duration;

use tracing::info;

use crate::config::MappingsConfig;

pub use anidb::{AniDbOverrides, AniDbSeasonOverride};
pub use cache::MappingCache;
pub use table::MappingTable;
pub use types::{MappingEntry, MappingError, TmdbType};

const ANIME_IDS_FILE: &str = "anime_ids.json";
const ANIDB_LIST_FILE: &str = "anime-list-master.xml";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Both mapping documents, parsed.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    pub table: MappingTable,
    pub overrides: AniDbOverrides,
}

impl MappingStore {
    pub fn new(table: MappingTable, overrides: AniDbOverrides) -> Self {
        Self { table, overrides }
    }

    /// Fetch (or reuse cached) documents and parse them.
    ///
    /// Failure here is fatal for a run.
    pub async fn load(config: &MappingsConfig) -> Result<Self, MappingError> {
        let cache = MappingCache::new(&config.cache_dir, config.cache_days, DOWNLOAD_TIMEOUT)?;

        let ids_json = cache.fetch(&config.anime_ids_url, ANIME_IDS_FILE).await?;
        let table = MappingTable::from_json(&ids_json)?;

        let anidb_xml = cache.fetch(&config.anidb_list_url, ANIDB_LIST_FILE).await?;
        let overrides = AniDbOverrides::parse(&anidb_xml)?;

        info!(
            rows = table.len(),
            overrides = overrides.len(),
            "Loaded identifier mappings"
        );

        Ok(Self { table, overrides })
    }
}
