//! Library manager abstraction.
//!
//! The sync pipeline only needs to list what a library holds and which
//! release groups its files came from. `SonarrClient` and `RadarrClient`
//! implement that over the v3 REST APIs.

mod arr;
mod radarr;
mod sonarr;
mod types;

pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;
pub use types::*;

use async_trait::async_trait;

/// Series-oriented library (Sonarr).
#[async_trait]
pub trait SeriesLibrary: Send + Sync {
    async fn list_all_series(&self) -> Result<Vec<Series>, LibraryError>;

    /// Every episode of a series, with file information.
    async fn list_episodes(&self, series_id: i64) -> Result<Vec<Episode>, LibraryError>;
}

/// Movie-oriented library (Radarr).
#[async_trait]
pub trait MovieLibrary: Send + Sync {
    async fn list_all_movies(&self) -> Result<Vec<Movie>, LibraryError>;

    /// Release group of the movie's file.
    ///
    /// Fails with `DataInconsistency` when more than one file is attached.
    async fn get_release_group(&self, movie_id: i64) -> Result<Option<String>, LibraryError>;
}
