//! Series-manager (Sonarr) run.

use tracing::{info, warn};

use crate::config::LibraryKind;
use crate::episodes::{resolve_episode_window, LocalReleaseFingerprint};
use crate::library::{Episode, Movie, MovieLibrary, Series, SeriesLibrary};
use crate::mapping::{MappingEntry, MappingStore, TmdbType};
use crate::metrics;

use super::context::RunContext;
use super::reconcile::MatchInput;
use super::types::{ItemError, ItemOutcome, SkipReason, SyncError, SyncRunSummary};

/// Series the mapping table knows by TVDB or IMDb id, sorted by title.
fn mapped_series(all: Vec<Series>, mappings: &MappingStore) -> Vec<Series> {
    let mut series: Vec<Series> = all
        .into_iter()
        .filter(|s| {
            s.tvdb_id.is_some_and(|id| mappings.table.knows_tvdb(id))
                || s.imdb_id
                    .as_deref()
                    .is_some_and(|id| mappings.table.knows_imdb(id))
        })
        .collect();
    series.sort_by(|a, b| a.title.cmp(&b.title));
    series
}

/// Movies matching a specials mapping by TMDB movie id or IMDb id.
fn movies_for_mapping<'a>(mapping: &MappingEntry, movies: &'a [Movie]) -> Vec<&'a Movie> {
    movies
        .iter()
        .filter(|m| {
            let tmdb_match = mapping.tmdb_movie_id.is_some() && m.tmdb_id == mapping.tmdb_movie_id;
            let imdb_match = m.imdb_id.as_deref().is_some_and(|id| mapping.has_imdb(id));
            tmdb_match || imdb_match
        })
        .collect()
}

/// Reconcile every mapped series of a series library.
///
/// `movies` is consulted only when `ignore_movies_in_movie_library` is set.
/// Per-series failures are recorded and never abort the run; the run
/// returns early once the torrent cap is reached.
pub async fn run_series_sync(
    ctx: &mut RunContext,
    mappings: &MappingStore,
    library: &dyn SeriesLibrary,
    movies: Option<&dyn MovieLibrary>,
) -> Result<SyncRunSummary, SyncError> {
    let timer = metrics::RUN_DURATION
        .with_label_values(&[LibraryKind::Sonarr.as_str()])
        .start_timer();
    let mut summary = SyncRunSummary::new(LibraryKind::Sonarr);

    let all_series = mapped_series(library.list_all_series().await?, mappings);

    let movie_list = match movies {
        Some(movies) if ctx.ignore_movies_in_movie_library => movies.list_all_movies().await?,
        _ => Vec::new(),
    };

    info!(series = all_series.len(), "Starting series sync");

    for series in &all_series {
        summary.items_processed += 1;
        info!(title = %series.title, "Processing series");

        let matches = match mappings.table.resolve_tracking_ids(
            series.tvdb_id,
            None,
            series.imdb_id.as_deref(),
            TmdbType::Show,
        ) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(title = %series.title, error = %e, "Failed to resolve tracking ids");
                summary.record(&series.title, None, ItemOutcome::failed(e));
                continue;
            }
        };

        if matches.is_empty() {
            info!(title = %series.title, "No tracking-service mapping");
            summary.record(&series.title, None, ItemOutcome::skipped(SkipReason::NoMapping));
            continue;
        }

        let episodes = match library.list_episodes(series.id).await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(title = %series.title, error = %e, "Failed to list episodes");
                summary.record(&series.title, None, ItemOutcome::failed(e));
                continue;
            }
        };

        for mapping in &matches {
            let Some(tracking_id) = mapping.anilist_id else {
                continue;
            };

            let outcome =
                match process_mapping(ctx, mappings, series, mapping, &episodes, &movie_list).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(
                            title = %series.title,
                            tracking_id,
                            error = %e,
                            added = e.torrents_added(),
                            "Failed to process series, skipping"
                        );
                        ItemOutcome::from(e)
                    }
                };
            summary.record(&series.title, Some(tracking_id), outcome);

            ctx.pause().await;

            if ctx.counter.cap_reached() {
                info!(
                    added = ctx.counter.added(),
                    cap = ?ctx.counter.cap(),
                    "Reached maximum number of torrents to add, stopping"
                );
                summary.cap_reached = true;
                timer.observe_duration();
                return Ok(summary.finish());
            }
        }
    }

    timer.observe_duration();
    Ok(summary.finish())
}

async fn process_mapping(
    ctx: &mut RunContext,
    mappings: &MappingStore,
    series: &Series,
    mapping: &MappingEntry,
    episodes: &[Episode],
    movie_list: &[Movie],
) -> Result<ItemOutcome, ItemError> {
    let tracking_id = mapping.anilist_id.unwrap_or_default();

    if mapping.tvdb_season == 0 {
        let in_movies = movies_for_mapping(mapping, movie_list);
        if !in_movies.is_empty() {
            for movie in in_movies {
                info!(title = %movie.title, "Found in movie library, skipping");
            }
            return Ok(ItemOutcome::skipped(SkipReason::InMovieLibrary));
        }
    }

    let Some(entry) = ctx.release_index.get_entry(tracking_id).await? else {
        info!(title = %series.title, tracking_id, "No release index entry");
        return Ok(ItemOutcome::skipped(SkipReason::NoIndexEntry));
    };

    let media = ctx.media(tracking_id).await?;
    info!(title = %media.title, tracking_id, url = %entry.url, "Release index entry found");

    let window = resolve_episode_window(
        episodes,
        mapping,
        mappings.overrides.rows(mapping.anidb_id, mapping.tvdb_season),
        media.format.as_deref(),
        media.episodes,
    )?;

    let local = LocalReleaseFingerprint::from_episodes(&window);
    if local.missing_episodes > 0 {
        info!(
            title = %series.title,
            "Missing episodes: {}/{}",
            local.missing_episodes,
            local.total_episodes
        );
    }

    ctx.reconcile(MatchInput {
        library: LibraryKind::Sonarr,
        title: &series.title,
        media: &media,
        entry: &entry,
        local: &local,
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{AniDbOverrides, MappingTable};

    fn series(id: i64, title: &str, tvdb: Option<i64>, imdb: Option<&str>) -> Series {
        Series {
            id,
            title: title.to_string(),
            tvdb_id: tvdb,
            imdb_id: imdb.map(str::to_string),
        }
    }

    fn movie(tmdb: Option<i64>, imdb: Option<&str>) -> Movie {
        Movie {
            id: 1,
            title: "Movie".to_string(),
            tmdb_id: tmdb,
            imdb_id: imdb.map(str::to_string),
        }
    }

    #[test]
    fn test_mapped_series_filters_and_sorts() {
        let mut by_tvdb = MappingEntry::new(1);
        by_tvdb.tvdb_id = Some(100);
        let mut by_imdb = MappingEntry::new(2);
        by_imdb.imdb_ids = vec!["tt200".to_string()];
        let store = MappingStore::new(
            MappingTable::from_entries(vec![by_tvdb, by_imdb]),
            AniDbOverrides::default(),
        );

        let all = vec![
            series(1, "Zeta", Some(100), None),
            series(2, "Alpha", None, Some("tt200")),
            series(3, "Unmapped", Some(999), None),
        ];
        let titles: Vec<String> = mapped_series(all, &store)
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_movies_for_mapping_matches_either_id() {
        let mut mapping = MappingEntry::new(1);
        mapping.tvdb_season = 0;
        mapping.tmdb_movie_id = Some(10);
        mapping.imdb_ids = vec!["tt1".to_string()];

        let movies = vec![
            movie(Some(10), None),
            movie(None, Some("tt1")),
            movie(Some(11), Some("tt2")),
        ];
        assert_eq!(movies_for_mapping(&mapping, &movies).len(), 2);
    }

    #[test]
    fn test_movies_for_mapping_without_ids() {
        let mapping = MappingEntry::new(1);
        let movies = vec![movie(None, None)];
        assert!(movies_for_mapping(&mapping, &movies).is_empty());
    }
}
