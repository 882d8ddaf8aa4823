//! Mock Sonarr/Radarr libraries for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::library::{Episode, LibraryError, Movie, MovieLibrary, Series, SeriesLibrary};

/// In-memory series library.
#[derive(Debug, Default)]
pub struct MockSeriesLibrary {
    series: Arc<RwLock<Vec<Series>>>,
    episodes: Arc<RwLock<HashMap<i64, Vec<Episode>>>>,
    /// Series ids whose episode listing fails.
    failing: Arc<RwLock<Vec<i64>>>,
}

impl MockSeriesLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_series(&self, series: Series, episodes: Vec<Episode>) {
        self.episodes.write().await.insert(series.id, episodes);
        self.series.write().await.push(series);
    }

    /// Make `list_episodes` fail for one series.
    pub async fn fail_episodes_for(&self, series_id: i64) {
        self.failing.write().await.push(series_id);
    }
}

#[async_trait]
impl SeriesLibrary for MockSeriesLibrary {
    async fn list_all_series(&self) -> Result<Vec<Series>, LibraryError> {
        Ok(self.series.read().await.clone())
    }

    async fn list_episodes(&self, series_id: i64) -> Result<Vec<Episode>, LibraryError> {
        if self.failing.read().await.contains(&series_id) {
            return Err(LibraryError::ApiError {
                status: 500,
                message: format!("episodes for series {} unavailable", series_id),
            });
        }
        Ok(self
            .episodes
            .read()
            .await
            .get(&series_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory movie library. Each movie holds zero or more file groups.
#[derive(Debug, Default)]
pub struct MockMovieLibrary {
    movies: Arc<RwLock<Vec<Movie>>>,
    files: Arc<RwLock<HashMap<i64, Vec<Option<String>>>>>,
}

impl MockMovieLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a movie with one file per entry of `file_groups`.
    pub async fn add_movie(&self, movie: Movie, file_groups: Vec<Option<&str>>) {
        self.files.write().await.insert(
            movie.id,
            file_groups
                .into_iter()
                .map(|g| g.map(str::to_string))
                .collect(),
        );
        self.movies.write().await.push(movie);
    }
}

#[async_trait]
impl MovieLibrary for MockMovieLibrary {
    async fn list_all_movies(&self) -> Result<Vec<Movie>, LibraryError> {
        Ok(self.movies.read().await.clone())
    }

    async fn get_release_group(&self, movie_id: i64) -> Result<Option<String>, LibraryError> {
        let files = self.files.read().await;
        match files.get(&movie_id).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([group]) => Ok(group.clone()),
            Some(many) => Err(LibraryError::DataInconsistency(format!(
                "movie {} has {} files",
                movie_id,
                many.len()
            ))),
        }
    }
}
