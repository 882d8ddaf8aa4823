use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub mappings: MappingsConfig,
    #[serde(default)]
    pub release_index: ReleaseIndexConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub sonarr: Option<LibraryConfig>,
    #[serde(default)]
    pub radarr: Option<LibraryConfig>,
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
}

/// Which library manager a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryKind {
    Sonarr,
    Radarr,
}

impl LibraryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryKind::Sonarr => "sonarr",
            LibraryKind::Radarr => "radarr",
        }
    }
}

impl std::fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release selection and run behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Trackers torrents may be taken from (case-insensitive).
    #[serde(default = "default_trackers")]
    pub trackers: Vec<String>,
    /// Prefer torrents from public trackers.
    #[serde(default = "default_true")]
    pub public_only: bool,
    /// Prefer torrents flagged as best by the curators.
    #[serde(default = "default_true")]
    pub want_best: bool,
    /// Prefer dual audio torrents.
    #[serde(default = "default_true")]
    pub prefer_dual_audio: bool,
    /// Stop the run once this many torrents were added (unlimited if unset).
    #[serde(default)]
    pub max_torrents_to_add: Option<u32>,
    /// Delay after each tracking match, in seconds.
    #[serde(default = "default_sleep_time")]
    pub sleep_time_secs: f64,
    /// Ask which release group to grab when several are recommended.
    #[serde(default)]
    pub interactive: bool,
    /// During a series run, skip specials that already exist as movies.
    #[serde(default)]
    pub ignore_movies_in_movie_library: bool,
    /// Report mismatches without touching the download client.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            trackers: default_trackers(),
            public_only: true,
            want_best: true,
            prefer_dual_audio: true,
            max_torrents_to_add: None,
            sleep_time_secs: default_sleep_time(),
            interactive: false,
            ignore_movies_in_movie_library: false,
            dry_run: false,
        }
    }
}

fn default_trackers() -> Vec<String> {
    vec!["Nyaa".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_sleep_time() -> f64 {
    2.0
}

/// Where the identifier mapping documents come from and how long they are cached.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingsConfig {
    #[serde(default = "default_anime_ids_url")]
    pub anime_ids_url: String,
    #[serde(default = "default_anidb_list_url")]
    pub anidb_list_url: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Re-download a cached document once it is this many days old.
    #[serde(default = "default_cache_days")]
    pub cache_days: u32,
}

impl Default for MappingsConfig {
    fn default() -> Self {
        Self {
            anime_ids_url: default_anime_ids_url(),
            anidb_list_url: default_anidb_list_url(),
            cache_dir: default_cache_dir(),
            cache_days: default_cache_days(),
        }
    }
}

fn default_anime_ids_url() -> String {
    "https://raw.githubusercontent.com/Kometa-Team/Anime-IDs/refs/heads/master/anime_ids.json"
        .to_string()
}

fn default_anidb_list_url() -> String {
    "https://raw.githubusercontent.com/Anime-Lists/anime-lists/refs/heads/master/anime-list-master.xml"
        .to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cache_days() -> u32 {
    1
}

/// Best-release index API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseIndexConfig {
    #[serde(default = "default_release_index_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for ReleaseIndexConfig {
    fn default() -> Self {
        Self {
            base_url: default_release_index_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_release_index_url() -> String {
    "https://releases.moe".to_string()
}

/// Tracking service (AniList) API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            base_url: default_tracking_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_tracking_url() -> String {
    "https://graphql.anilist.co".to_string()
}

/// Sonarr / Radarr connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Base URL (e.g., "http://localhost:8989")
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// qBittorrent WebUI connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// WebUI URL (e.g., "http://localhost:8080")
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Category for added torrents when no per-library category is set.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sonarr_category: Option<String>,
    #[serde(default)]
    pub radarr_category: Option<String>,
}

impl QBittorrentConfig {
    /// Category to tag torrents added during a run for `kind`.
    pub fn category_for(&self, kind: LibraryKind) -> Option<String> {
        let specific = match kind {
            LibraryKind::Sonarr => self.sonarr_category.as_ref(),
            LibraryKind::Radarr => self.radarr_category.as_ref(),
        };
        specific.or(self.category.as_ref()).cloned()
    }
}

/// Discord webhook notifications.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

fn default_timeout() -> u32 {
    30
}
