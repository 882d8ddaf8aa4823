//! Sonarr v3 client.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::LibraryConfig;

use super::arr::{non_empty, non_zero, ArrClient};
use super::{Episode, LibraryError, Series, SeriesLibrary};

pub struct SonarrClient {
    inner: ArrClient,
}

impl SonarrClient {
    pub fn new(config: &LibraryConfig) -> Result<Self, LibraryError> {
        Ok(Self {
            inner: ArrClient::new(config, "sonarr")?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrSeries {
    id: i64,
    title: String,
    #[serde(default)]
    tvdb_id: Option<i64>,
    #[serde(default)]
    imdb_id: Option<String>,
}

impl From<SonarrSeries> for Series {
    fn from(s: SonarrSeries) -> Self {
        Series {
            id: s.id,
            title: s.title,
            tvdb_id: non_zero(s.tvdb_id),
            imdb_id: non_empty(s.imdb_id),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrEpisode {
    season_number: i32,
    episode_number: i32,
    #[serde(default)]
    episode_file_id: i64,
    #[serde(default)]
    episode_file: Option<SonarrEpisodeFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrEpisodeFile {
    #[serde(default)]
    release_group: Option<String>,
}

impl From<SonarrEpisode> for Episode {
    fn from(e: SonarrEpisode) -> Self {
        let has_file = e.episode_file_id != 0;
        Episode {
            season_number: e.season_number,
            episode_number: e.episode_number,
            has_file,
            release_group: if has_file {
                e.episode_file.and_then(|f| non_empty(f.release_group))
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl SeriesLibrary for SonarrClient {
    async fn list_all_series(&self) -> Result<Vec<Series>, LibraryError> {
        let series: Vec<SonarrSeries> = self.inner.get_json("series", &[]).await?;
        Ok(series.into_iter().map(Series::from).collect())
    }

    async fn list_episodes(&self, series_id: i64) -> Result<Vec<Episode>, LibraryError> {
        let episodes: Vec<SonarrEpisode> = self
            .inner
            .get_json(
                "episode",
                &[
                    ("seriesId", series_id.to_string()),
                    ("includeEpisodeFile", "true".to_string()),
                ],
            )
            .await?;
        Ok(episodes.into_iter().map(Episode::from).collect())
    }
}
