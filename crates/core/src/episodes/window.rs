//! Selects the episodes of a series that belong to one AniList entry.

use std::collections::BTreeSet;

use tracing::debug;

use crate::library::Episode;
use crate::mapping::{AniDbSeasonOverride, MappingEntry};

use super::EpisodeWindowError;

/// AniList format for a regular TV run. Anything else (OVA, ONA, MOVIE,
/// SPECIAL, TV_SHORT, unknown) may need the AniDB override table.
pub const TV_FORMAT: &str = "TV";

/// Season number meaning "every season except specials".
const ALL_MAIN_SEASONS: i32 = -1;

/// Compute the episode window for one mapping row.
///
/// `anidb_overrides` are the override rows recorded for
/// `(mapping.anidb_id, mapping.tvdb_season)`. They are only consulted for
/// non-TV formats or season 0, and when exactly one applies its episode
/// set replaces the offset/count slicing entirely.
pub fn resolve_episode_window(
    all_episodes: &[Episode],
    mapping: &MappingEntry,
    anidb_overrides: &[AniDbSeasonOverride],
    tracking_format: Option<&str>,
    tracking_episode_count: Option<u32>,
) -> Result<Vec<Episode>, EpisodeWindowError> {
    let season = mapping.tvdb_season;

    let mut selected: Vec<Episode> = all_episodes
        .iter()
        .filter(|ep| {
            if season == ALL_MAIN_SEASONS {
                ep.season_number != 0
            } else {
                ep.season_number == season
            }
        })
        .cloned()
        .collect();
    selected.sort_by_key(|ep| (ep.season_number, ep.episode_number));

    let needs_override = tracking_format != Some(TV_FORMAT) || season == 0;
    if needs_override {
        match anidb_overrides {
            [] => {}
            [single] => {
                let wanted: BTreeSet<u32> = single.tvdb_episodes();
                debug!(
                    anidb_id = mapping.anidb_id,
                    season,
                    episodes = wanted.len(),
                    "Using AniDB episode override"
                );
                selected.retain(|ep| {
                    u32::try_from(ep.episode_number).is_ok_and(|n| wanted.contains(&n))
                });
                return Ok(selected);
            }
            many => {
                return Err(EpisodeWindowError::DataInconsistency(format!(
                    "{} AniDB override rows for anidb id {} season {}",
                    many.len(),
                    mapping.anidb_id,
                    season
                )))
            }
        }
    }

    let offset = usize::try_from(mapping.tvdb_epoffset.max(0)).unwrap_or(0);
    let count = tracking_episode_count
        .map(|n| n as usize)
        .unwrap_or_else(|| selected.len().saturating_sub(offset));

    Ok(selected.into_iter().skip(offset).take(count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(season: i32, count: i32, group: &str) -> Vec<Episode> {
        (1..=count)
            .map(|n| Episode::with_file(season, n, group))
            .collect()
    }

    fn mapping(season: i32, offset: i32) -> MappingEntry {
        MappingEntry {
            tvdb_season: season,
            tvdb_epoffset: offset,
            anilist_id: Some(1),
            ..MappingEntry::new(99)
        }
    }

    fn numbers(eps: &[Episode]) -> Vec<i32> {
        eps.iter().map(|e| e.episode_number).collect()
    }

    fn override_row(season: i32, tvdb_eps: &[u32]) -> AniDbSeasonOverride {
        AniDbSeasonOverride {
            anidb_id: 99,
            tvdb_season: season,
            episodes: tvdb_eps.iter().enumerate().map(|(i, t)| (i as u32 + 1, *t)).collect(),
        }
    }

    #[test]
    fn test_first_cour() {
        let eps = season(1, 26, "A");
        let window =
            resolve_episode_window(&eps, &mapping(1, 0), &[], Some(TV_FORMAT), Some(13)).unwrap();
        assert_eq!(numbers(&window), (1..=13).collect::<Vec<_>>());
    }

    #[test]
    fn test_offset_slicing() {
        let eps = season(1, 26, "A");
        let window =
            resolve_episode_window(&eps, &mapping(1, 13), &[], Some(TV_FORMAT), Some(12)).unwrap();
        assert_eq!(numbers(&window), (14..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_count_takes_rest() {
        let eps = season(1, 26, "A");
        let window =
            resolve_episode_window(&eps, &mapping(1, 20), &[], Some(TV_FORMAT), None).unwrap();
        assert_eq!(numbers(&window), (21..=26).collect::<Vec<_>>());
    }

    #[test]
    fn test_short_source_is_not_an_error() {
        let eps = season(1, 10, "A");
        let window =
            resolve_episode_window(&eps, &mapping(1, 5), &[], Some(TV_FORMAT), Some(12)).unwrap();
        assert_eq!(numbers(&window), (6..=10).collect::<Vec<_>>());

        let window =
            resolve_episode_window(&eps, &mapping(1, 40), &[], Some(TV_FORMAT), Some(12)).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn test_all_seasons_excludes_specials_and_sorts() {
        let mut eps = season(2, 3, "A");
        eps.extend(season(0, 2, "S"));
        eps.extend(season(1, 3, "A"));

        let window =
            resolve_episode_window(&eps, &mapping(-1, 0), &[], Some(TV_FORMAT), None).unwrap();
        let keys: Vec<(i32, i32)> = window
            .iter()
            .map(|e| (e.season_number, e.episode_number))
            .collect();
        assert_eq!(keys, vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let eps = season(1, 4, "A");
        let window =
            resolve_episode_window(&eps, &mapping(1, -3), &[], Some(TV_FORMAT), Some(2)).unwrap();
        assert_eq!(numbers(&window), vec![1, 2]);
    }

    #[test]
    fn test_override_takes_precedence() {
        let eps = season(0, 10, "S");
        let row = override_row(0, &[2, 7, 9]);
        // Offset arithmetic alone would give episodes 1-3.
        let window =
            resolve_episode_window(&eps, &mapping(0, 0), &[row], Some("OVA"), Some(3)).unwrap();
        assert_eq!(numbers(&window), vec![2, 7, 9]);
    }

    #[test]
    fn test_override_ignored_for_tv_main_season() {
        let eps = season(1, 12, "A");
        let row = override_row(1, &[5]);
        let window =
            resolve_episode_window(&eps, &mapping(1, 0), &[row], Some(TV_FORMAT), Some(12)).unwrap();
        assert_eq!(window.len(), 12);
    }

    #[test]
    fn test_override_used_for_tv_specials() {
        let eps = season(0, 5, "S");
        let row = override_row(0, &[4]);
        let window =
            resolve_episode_window(&eps, &mapping(0, 0), &[row], Some(TV_FORMAT), Some(1)).unwrap();
        assert_eq!(numbers(&window), vec![4]);
    }

    #[test]
    fn test_unknown_format_consults_override() {
        let eps = season(1, 5, "A");
        let row = override_row(1, &[1, 2]);
        let window = resolve_episode_window(&eps, &mapping(1, 0), &[row], None, None).unwrap();
        assert_eq!(numbers(&window), vec![1, 2]);
    }

    #[test]
    fn test_multiple_override_rows_is_inconsistent() {
        let eps = season(0, 5, "S");
        let rows = vec![override_row(0, &[1]), override_row(0, &[2])];
        let result = resolve_episode_window(&eps, &mapping(0, 0), &rows, Some("MOVIE"), Some(1));
        assert!(matches!(
            result,
            Err(EpisodeWindowError::DataInconsistency(_))
        ));
    }
}
