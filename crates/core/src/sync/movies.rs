//! Movie-manager (Radarr) run.

use tracing::{info, warn};

use crate::config::LibraryKind;
use crate::episodes::LocalReleaseFingerprint;
use crate::library::{Movie, MovieLibrary};
use crate::mapping::{MappingEntry, MappingStore, TmdbType};
use crate::metrics;

use super::context::RunContext;
use super::reconcile::MatchInput;
use super::types::{ItemError, ItemOutcome, SkipReason, SyncError, SyncRunSummary};

/// Movies the mapping table knows by TMDB movie id or IMDb id, sorted by title.
fn mapped_movies(all: Vec<Movie>, mappings: &MappingStore) -> Vec<Movie> {
    let mut movies: Vec<Movie> = all
        .into_iter()
        .filter(|m| {
            m.tmdb_id.is_some_and(|id| mappings.table.knows_tmdb_movie(id))
                || m.imdb_id
                    .as_deref()
                    .is_some_and(|id| mappings.table.knows_imdb(id))
        })
        .collect();
    movies.sort_by(|a, b| a.title.cmp(&b.title));
    movies
}

/// Reconcile every mapped movie of a movie library.
pub async fn run_movie_sync(
    ctx: &mut RunContext,
    mappings: &MappingStore,
    library: &dyn MovieLibrary,
) -> Result<SyncRunSummary, SyncError> {
    let timer = metrics::RUN_DURATION
        .with_label_values(&[LibraryKind::Radarr.as_str()])
        .start_timer();
    let mut summary = SyncRunSummary::new(LibraryKind::Radarr);

    let all_movies = mapped_movies(library.list_all_movies().await?, mappings);
    info!(movies = all_movies.len(), "Starting movie sync");

    for movie in &all_movies {
        summary.items_processed += 1;
        info!(title = %movie.title, "Processing movie");

        let matches = match mappings.table.resolve_tracking_ids(
            None,
            movie.tmdb_id,
            movie.imdb_id.as_deref(),
            TmdbType::Movie,
        ) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(title = %movie.title, error = %e, "Failed to resolve tracking ids");
                summary.record(&movie.title, None, ItemOutcome::failed(e));
                continue;
            }
        };

        if matches.is_empty() {
            info!(title = %movie.title, "No tracking-service mapping");
            summary.record(&movie.title, None, ItemOutcome::skipped(SkipReason::NoMapping));
            continue;
        }

        // More than one file is a data inconsistency for this movie only.
        let local = match library.get_release_group(movie.id).await {
            Ok(group) => LocalReleaseFingerprint::from_movie(group),
            Err(e) => {
                warn!(title = %movie.title, error = %e, "Failed to read movie release group, skipping");
                summary.record(&movie.title, None, ItemOutcome::failed(e));
                continue;
            }
        };

        for mapping in &matches {
            let Some(tracking_id) = mapping.anilist_id else {
                continue;
            };

            let outcome = match process_mapping(ctx, movie, mapping, &local).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        title = %movie.title,
                        tracking_id,
                        error = %e,
                        added = e.torrents_added(),
                        "Failed to process movie, skipping"
                    );
                    ItemOutcome::from(e)
                }
            };
            summary.record(&movie.title, Some(tracking_id), outcome);

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
    movie: &Movie,
    mapping: &MappingEntry,
    local: &LocalReleaseFingerprint,
) -> Result<ItemOutcome, ItemError> {
    let tracking_id = mapping.anilist_id.unwrap_or_default();

    let Some(entry) = ctx.release_index.get_entry(tracking_id).await? else {
        info!(title = %movie.title, tracking_id, "No release index entry");
        return Ok(ItemOutcome::skipped(SkipReason::NoIndexEntry));
    };

    let media = ctx.media(tracking_id).await?;
    info!(title = %media.title, tracking_id, url = %entry.url, "Release index entry found");

    ctx.reconcile(MatchInput {
        library: LibraryKind::Radarr,
        title: &movie.title,
        media: &media,
        entry: &entry,
        local,
    })
    .await
}
