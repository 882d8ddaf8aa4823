pub mod config;
pub mod dispatch;
pub mod download_client;
pub mod episodes;
pub mod library;
pub mod mapping;
pub mod metrics;
pub mod notify;
pub mod release_index;
pub mod selection;
pub mod status;
pub mod sync;
pub mod testing;
pub mod tracking;

pub use config::{
    load_config, load_config_from_str, validate_config, validate_for_library, Config, ConfigError,
    LibraryKind,
};
pub use mapping::{MappingEntry, MappingError, MappingStore};
pub use selection::{select_recommended_releases, RecommendedReleaseSet, SelectionPreferences};
pub use sync::{run_movie_sync, run_series_sync, RunContext, SyncError, SyncRunSummary};
