//! Radarr v3 client.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::LibraryConfig;

use super::arr::{non_empty, non_zero, ArrClient};
use super::{LibraryError, Movie, MovieLibrary};

pub struct RadarrClient {
    inner: ArrClient,
}

impl RadarrClient {
    pub fn new(config: &LibraryConfig) -> Result<Self, LibraryError> {
        Ok(Self {
            inner: ArrClient::new(config, "radarr")?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie {
    id: i64,
    title: String,
    #[serde(default)]
    tmdb_id: Option<i64>,
    #[serde(default)]
    imdb_id: Option<String>,
}

impl From<RadarrMovie> for Movie {
    fn from(m: RadarrMovie) -> Self {
        Movie {
            id: m.id,
            title: m.title,
            tmdb_id: non_zero(m.tmdb_id),
            imdb_id: non_empty(m.imdb_id),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovieFile {
    #[serde(default)]
    release_group: Option<String>,
}

/// Release group of the single file behind a movie.
///
/// No file gives `None`; more than one file is an inconsistency.
fn single_release_group(
    movie_id: i64,
    files: Vec<RadarrMovieFile>,
) -> Result<Option<String>, LibraryError> {
    match files.len() {
        0 => Ok(None),
        1 => Ok(files.into_iter().next().and_then(|f| non_empty(f.release_group))),
        n => Err(LibraryError::DataInconsistency(format!(
            "movie {} has {} files attached",
            movie_id, n
        ))),
    }
}

#[async_trait]
impl MovieLibrary for RadarrClient {
    async fn list_all_movies(&self) -> Result<Vec<Movie>, LibraryError> {
        let movies: Vec<RadarrMovie> = self.inner.get_json("movie", &[]).await?;
        Ok(movies.into_iter().map(Movie::from).collect())
    }

    async fn get_release_group(&self, movie_id: i64) -> Result<Option<String>, LibraryError> {
        let files: Vec<RadarrMovieFile> = self
            .inner
            .get_json("moviefile", &[("movieId", movie_id.to_string())])
            .await?;
        single_release_group(movie_id, files)
    }
}
