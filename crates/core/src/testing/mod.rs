//! Testing utilities and mock implementations of the collaborator traits.
//!
//! Every remote service the sync pipeline talks to has an in-memory mock
//! here, so whole runs can be driven without Sonarr, Radarr, AniList,
//! releases.moe or qBittorrent.
//!
//! # Example
//!
//! ```rust,ignore
//! use relsync_core::testing::{fixtures, MockReleaseIndex, MockTrackingService};
//!
//! let index = MockReleaseIndex::new();
//! index.insert(fixtures::index_entry(20, vec![fixtures::nyaa_candidate("GroupA", 1)])).await;
//!
//! let tracking = MockTrackingService::new();
//! tracking.insert(fixtures::tv_media(20, "Show", Some(24))).await;
//! ```

mod mock_download_client;
mod mock_library;
mod mock_notifier;
mod mock_release_index;
mod mock_resolver;
mod mock_tracking;

pub use mock_download_client::{MockDownloadClient, RecordedAddUrl};
pub use mock_library::{MockMovieLibrary, MockSeriesLibrary};
pub use mock_notifier::MockNotifier;
pub use mock_release_index::MockReleaseIndex;
pub use mock_resolver::MockTorrentUrlResolver;
pub use mock_tracking::MockTrackingService;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::SyncConfig;
    use crate::library::{Episode, Movie, Series};
    use crate::mapping::MappingEntry;
    use crate::release_index::{ReleaseCandidate, ReleaseIndexEntry};
    use crate::tracking::MediaInfo;

    /// Sync settings for tests: Nyaa and AnimeTosho allowed, no delay.
    pub fn sync_config() -> SyncConfig {
        SyncConfig {
            trackers: vec!["Nyaa".to_string(), "AnimeTosho".to_string()],
            sleep_time_secs: 0.0,
            ..SyncConfig::default()
        }
    }

    /// Episodes 1..=count of a season, all with files from `group`.
    pub fn season_with_files(season: i32, count: i32, group: &str) -> Vec<Episode> {
        (1..=count)
            .map(|e| Episode::with_file(season, e, group))
            .collect()
    }

    /// Episodes 1..=count of a season, none with files.
    pub fn missing_season(season: i32, count: i32) -> Vec<Episode> {
        (1..=count).map(|e| Episode::missing(season, e)).collect()
    }

    /// Nyaa candidate with a hash derived from the view id.
    pub fn nyaa_candidate(group: &str, view_id: u32) -> ReleaseCandidate {
        ReleaseCandidate::new(
            group,
            "Nyaa",
            &format!("https://nyaa.si/view/{}", view_id),
            &nyaa_hash(view_id),
        )
    }

    /// Info hash used by `nyaa_candidate` for a view id.
    pub fn nyaa_hash(view_id: u32) -> String {
        format!("{:040x}", view_id)
    }

    pub fn index_entry(tracking_id: i64, torrents: Vec<ReleaseCandidate>) -> ReleaseIndexEntry {
        ReleaseIndexEntry {
            tracking_id,
            url: format!("https://releases.moe/{}/", tracking_id),
            notes: None,
            incomplete: false,
            torrents,
        }
    }

    /// TV-format media with an optional episode count.
    pub fn tv_media(id: i64, title: &str, episodes: Option<u32>) -> MediaInfo {
        MediaInfo {
            format: Some("TV".to_string()),
            episodes,
            thumbnail_url: Some(format!("https://img.anili.st/media/{}", id)),
            site_url: Some(format!("https://anilist.co/anime/{}", id)),
            ..MediaInfo::new(id, title)
        }
    }

    pub fn movie_media(id: i64, title: &str) -> MediaInfo {
        MediaInfo {
            format: Some("MOVIE".to_string()),
            episodes: Some(1),
            ..MediaInfo::new(id, title)
        }
    }

    /// Mapping row for a TVDB series, whole main run.
    pub fn tvdb_mapping(anidb_id: u32, tvdb_id: i64, anilist_id: i64) -> MappingEntry {
        MappingEntry {
            tvdb_id: Some(tvdb_id),
            anilist_id: Some(anilist_id),
            ..MappingEntry::new(anidb_id)
        }
    }

    /// Mapping row for a TMDB movie.
    pub fn tmdb_movie_mapping(anidb_id: u32, tmdb_id: i64, anilist_id: i64) -> MappingEntry {
        MappingEntry {
            tmdb_movie_id: Some(tmdb_id),
            anilist_id: Some(anilist_id),
            ..MappingEntry::new(anidb_id)
        }
    }

    pub fn series(id: i64, title: &str, tvdb_id: i64) -> Series {
        Series {
            id,
            title: title.to_string(),
            tvdb_id: Some(tvdb_id),
            imdb_id: None,
        }
    }

    pub fn movie(id: i64, title: &str, tmdb_id: i64) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            tmdb_id: Some(tmdb_id),
            imdb_id: None,
        }
    }
}
