//! Series sync integration tests.
//!
//! These drive `run_series_sync` end to end with mock collaborators:
//! - Match / mismatch reconciliation against the release index
//! - Dispatch, dedupe and the run-wide torrent cap
//! - Per-item failures that must not abort the run

use std::sync::Arc;

use relsync_core::{
    config::SyncConfig,
    dispatch::{Dispatcher, TrackerResolvers},
    library::{Episode, MovieLibrary},
    mapping::{AniDbOverrides, AniDbSeasonOverride, MappingEntry, MappingStore, MappingTable},
    run_series_sync,
    sync::{ItemOutcome, RunContext, SkipReason},
    testing::{
        fixtures, MockDownloadClient, MockMovieLibrary, MockNotifier, MockReleaseIndex,
        MockSeriesLibrary, MockTorrentUrlResolver, MockTrackingService,
    },
};

/// Mock collaborators shared by a test.
struct TestHarness {
    index: Arc<MockReleaseIndex>,
    tracking: Arc<MockTrackingService>,
    client: Arc<MockDownloadClient>,
    resolver: Arc<MockTorrentUrlResolver>,
    notifier: Arc<MockNotifier>,
    library: MockSeriesLibrary,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            index: Arc::new(MockReleaseIndex::new()),
            tracking: Arc::new(MockTrackingService::new()),
            client: Arc::new(MockDownloadClient::new()),
            resolver: Arc::new(MockTorrentUrlResolver::new("Nyaa")),
            notifier: Arc::new(MockNotifier::new()),
            library: MockSeriesLibrary::new(),
        }
    }

    fn context(&self, config: &SyncConfig) -> RunContext {
        let mut resolvers = TrackerResolvers::new();
        resolvers.register(self.resolver.clone());
        let dispatcher = Dispatcher::new(self.client.clone(), resolvers, Some("anime".to_string()));

        RunContext::new(config, self.tracking.clone(), self.index.clone())
            .with_dispatcher(dispatcher)
            .with_notifier(self.notifier.clone())
    }

    /// One TV series (TVDB id 100, AniList id 20, 24 episodes) whose
    /// local files all come from `local_group`.
    async fn single_series(&self, local_group: &str) {
        self.library
            .add_series(
                fixtures::series(1, "Show", 100),
                fixtures::season_with_files(1, 24, local_group),
            )
            .await;
        self.tracking
            .insert(fixtures::tv_media(20, "Show (AniList)", Some(24)))
            .await;
    }
}

fn store(entries: Vec<MappingEntry>) -> MappingStore {
    MappingStore::new(MappingTable::from_entries(entries), AniDbOverrides::default())
}

#[tokio::test]
async fn test_matching_release_group_needs_no_dispatch() {
    let h = TestHarness::new();
    h.single_series("GroupA").await;
    h.index
        .insert(fixtures::index_entry(20, vec![fixtures::nyaa_candidate("GroupA", 1)]))
        .await;

    let mappings = store(vec![fixtures::tvdb_mapping(1, 100, 20)]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.items_processed, 1);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.mismatched, 0);
    assert!(h.client.added_urls().await.is_empty());
    assert!(h.notifier.posted().await.is_empty());
}

#[tokio::test]
async fn test_mismatched_release_group_is_dispatched() {
    let h = TestHarness::new();
    h.single_series("GroupB").await;
    h.index
        .insert(fixtures::index_entry(20, vec![fixtures::nyaa_candidate("GroupA", 1)]))
        .await;

    let mappings = store(vec![fixtures::tvdb_mapping(1, 100, 20)]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.mismatched, 1);
    assert_eq!(summary.torrents_added, 1);
    assert_eq!(
        summary.outcomes[0].outcome,
        ItemOutcome::Mismatched {
            added: 1,
            would_add: 0
        }
    );

    let added = h.client.added().await;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].url, "https://nyaa.si/view/1.torrent");
    assert_eq!(added[0].category.as_deref(), Some("anime"));

    let posted = h.notifier.posted().await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].title, "Show");
    assert_eq!(posted[0].subtitle, "Show (AniList)");
    assert_eq!(posted[0].url.as_deref(), Some("https://releases.moe/20/"));
    assert!(posted[0]
        .fields
        .iter()
        .any(|f| f.name == "AniList" && f.value == "https://anilist.co/anime/20"));
}

#[tokio::test]
async fn test_failed_batch_still_counts_torrents_already_added() {
    let h = TestHarness::new();
    h.single_series("GroupB").await;
    h.index
        .insert(fixtures::index_entry(
            20,
            vec![
                fixtures::nyaa_candidate("GroupA", 1),
                fixtures::nyaa_candidate("GroupA", 2),
            ],
        ))
        .await;
    h.resolver.fail_for("https://nyaa.si/view/2").await;

    let mappings = store(vec![fixtures::tvdb_mapping(1, 100, 20)]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(h.client.added_urls().await, vec!["https://nyaa.si/view/1.torrent"]);
    assert_eq!(ctx.counter.added(), 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.torrents_added, 1);
    assert!(matches!(
        summary.outcomes[0].outcome,
        ItemOutcome::Failed { added: 1, .. }
    ));
    assert_eq!(h.notifier.posted().await.len(), 1);
}

#[tokio::test]
async fn test_already_present_torrent_is_not_added_or_notified() {
    let h = TestHarness::new();
    h.single_series("GroupB").await;
    h.client.add_hash(&fixtures::nyaa_hash(1)).await;
    h.index
        .insert(fixtures::index_entry(20, vec![fixtures::nyaa_candidate("GroupA", 1)]))
        .await;

    let mappings = store(vec![fixtures::tvdb_mapping(1, 100, 20)]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.mismatched, 1);
    assert_eq!(summary.torrents_added, 0);
    assert!(h.client.added_urls().await.is_empty());
    assert!(h.notifier.posted().await.is_empty());
}

#[tokio::test]
async fn test_cap_stops_the_run() {
    let h = TestHarness::new();
    h.library
        .add_series(
            fixtures::series(1, "A Show", 100),
            fixtures::season_with_files(1, 12, "Local"),
        )
        .await;
    h.library
        .add_series(
            fixtures::series(2, "B Show", 200),
            fixtures::season_with_files(1, 12, "Local"),
        )
        .await;
    h.tracking.insert(fixtures::tv_media(20, "A", Some(12))).await;
    h.tracking.insert(fixtures::tv_media(30, "B", Some(12))).await;
    h.index
        .insert(fixtures::index_entry(
            20,
            vec![
                fixtures::nyaa_candidate("GroupA", 1),
                fixtures::nyaa_candidate("GroupA", 2),
                fixtures::nyaa_candidate("GroupA", 3),
            ],
        ))
        .await;
    h.index
        .insert(fixtures::index_entry(30, vec![fixtures::nyaa_candidate("GroupB", 4)]))
        .await;

    let mappings = store(vec![
        fixtures::tvdb_mapping(1, 100, 20),
        fixtures::tvdb_mapping(2, 200, 30),
    ]);
    let config = SyncConfig {
        max_torrents_to_add: Some(1),
        ..fixtures::sync_config()
    };
    let mut ctx = h.context(&config);

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert!(summary.cap_reached);
    assert_eq!(summary.items_processed, 1);
    assert_eq!(summary.torrents_added, 1);
    assert_eq!(h.client.added_urls().await.len(), 1);
    assert_eq!(h.index.queries().await, vec![20]);
}

#[tokio::test]
async fn test_union_resolution_visits_every_matching_row() {
    let h = TestHarness::new();
    h.library
        .add_series(
            relsync_core::library::Series {
                id: 1,
                title: "Show".to_string(),
                tvdb_id: Some(100),
                imdb_id: Some("tt999".to_string()),
            },
            fixtures::season_with_files(1, 12, "GroupA"),
        )
        .await;

    let by_imdb = MappingEntry {
        imdb_ids: vec!["tt999".to_string()],
        anilist_id: Some(21),
        ..MappingEntry::new(2)
    };
    let mappings = store(vec![fixtures::tvdb_mapping(1, 100, 20), by_imdb]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(h.index.queries().await, vec![20, 21]);
    assert_eq!(summary.skipped_by(SkipReason::NoIndexEntry), 2);
}

#[tokio::test]
async fn test_row_without_tracking_id_is_skipped() {
    let h = TestHarness::new();
    h.single_series("GroupA").await;

    let unusable = MappingEntry {
        tvdb_id: Some(100),
        ..MappingEntry::new(1)
    };
    let mappings = store(vec![unusable]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.skipped_by(SkipReason::NoMapping), 1);
    assert!(h.index.queries().await.is_empty());
}

#[tokio::test]
async fn test_unmapped_series_are_not_processed() {
    let h = TestHarness::new();
    h.single_series("GroupA").await;

    let mappings = store(vec![fixtures::tvdb_mapping(1, 999, 20)]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.items_processed, 0);
    assert!(summary.outcomes.is_empty());
}

#[tokio::test]
async fn test_item_failure_does_not_abort_run() {
    let h = TestHarness::new();
    h.library
        .add_series(
            fixtures::series(1, "A Broken", 100),
            fixtures::season_with_files(1, 12, "GroupA"),
        )
        .await;
    h.library.fail_episodes_for(1).await;
    h.library
        .add_series(
            fixtures::series(2, "B Fine", 200),
            fixtures::season_with_files(1, 12, "GroupA"),
        )
        .await;
    h.tracking.insert(fixtures::tv_media(30, "B", Some(12))).await;
    h.index
        .insert(fixtures::index_entry(30, vec![fixtures::nyaa_candidate("GroupA", 1)]))
        .await;

    let mappings = store(vec![
        fixtures::tvdb_mapping(1, 100, 20),
        fixtures::tvdb_mapping(2, 200, 30),
    ]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.items_processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.matched, 1);
}

#[tokio::test]
async fn test_duplicate_override_rows_fail_only_that_item() {
    let h = TestHarness::new();
    let mut episodes = fixtures::season_with_files(1, 12, "GroupA");
    episodes.extend(fixtures::season_with_files(0, 3, "GroupA"));
    h.library
        .add_series(fixtures::series(1, "Show", 100), episodes)
        .await;

    h.tracking.insert(fixtures::tv_media(20, "Show", Some(12))).await;
    h.tracking
        .insert(relsync_core::tracking::MediaInfo {
            format: Some("OVA".to_string()),
            episodes: Some(2),
            ..relsync_core::tracking::MediaInfo::new(21, "Show OVA")
        })
        .await;
    h.index
        .insert(fixtures::index_entry(20, vec![fixtures::nyaa_candidate("GroupA", 1)]))
        .await;
    h.index
        .insert(fixtures::index_entry(21, vec![fixtures::nyaa_candidate("GroupA", 2)]))
        .await;

    let specials = MappingEntry {
        tvdb_season: 0,
        ..fixtures::tvdb_mapping(2, 100, 21)
    };
    let overrides = AniDbOverrides::from_overrides(vec![
        AniDbSeasonOverride {
            anidb_id: 2,
            tvdb_season: 0,
            episodes: vec![(1, 1)],
        },
        AniDbSeasonOverride {
            anidb_id: 2,
            tvdb_season: 0,
            episodes: vec![(1, 2)],
        },
    ]);
    let mappings = MappingStore::new(
        MappingTable::from_entries(vec![fixtures::tvdb_mapping(1, 100, 20), specials]),
        overrides,
    );
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.matched, 1);
    assert_eq!(summary.failed, 1);
    let failed = summary
        .outcomes
        .iter()
        .find(|r| matches!(r.outcome, ItemOutcome::Failed { .. }))
        .unwrap();
    assert_eq!(failed.tracking_id, Some(21));
}

#[tokio::test]
async fn test_specials_override_selects_window() {
    let h = TestHarness::new();
    // Specials 1-2 come from GroupA, special 3 from GroupB.
    let mut episodes = vec![
        Episode::with_file(0, 1, "GroupA"),
        Episode::with_file(0, 2, "GroupA"),
        Episode::with_file(0, 3, "GroupB"),
    ];
    episodes.extend(fixtures::season_with_files(1, 12, "GroupA"));
    h.library
        .add_series(fixtures::series(1, "Show", 100), episodes)
        .await;

    h.tracking
        .insert(relsync_core::tracking::MediaInfo {
            format: Some("OVA".to_string()),
            episodes: Some(1),
            ..relsync_core::tracking::MediaInfo::new(21, "Show OVA")
        })
        .await;
    h.index
        .insert(fixtures::index_entry(21, vec![fixtures::nyaa_candidate("GroupB", 7)]))
        .await;

    let specials = MappingEntry {
        tvdb_season: 0,
        ..fixtures::tvdb_mapping(2, 100, 21)
    };
    let overrides = AniDbOverrides::from_overrides(vec![AniDbSeasonOverride {
        anidb_id: 2,
        tvdb_season: 0,
        episodes: vec![(1, 3)],
    }]);
    let mappings = MappingStore::new(MappingTable::from_entries(vec![specials]), overrides);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    // Offset slicing would start at special 1 (GroupA) and mismatch.
    assert_eq!(summary.matched, 1);
    assert!(h.client.added_urls().await.is_empty());
}

#[tokio::test]
async fn test_dry_run_reports_without_dispatching() {
    let h = TestHarness::new();
    h.single_series("GroupB").await;
    h.index
        .insert(fixtures::index_entry(
            20,
            vec![
                fixtures::nyaa_candidate("GroupA", 1),
                fixtures::nyaa_candidate("GroupC", 2),
            ],
        ))
        .await;

    let mappings = store(vec![fixtures::tvdb_mapping(1, 100, 20)]);
    let config = SyncConfig {
        dry_run: true,
        ..fixtures::sync_config()
    };
    let mut ctx = h.context(&config);

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.torrents_added, 0);
    assert_eq!(summary.torrents_would_add, 2);
    assert_eq!(ctx.counter.added(), 2);
    assert_eq!(h.client.list_calls().await, 0);
    assert_eq!(h.notifier.posted().await.len(), 1);
}

#[tokio::test]
async fn test_special_already_in_movie_library_is_skipped() {
    let h = TestHarness::new();
    h.library
        .add_series(
            fixtures::series(1, "Show", 100),
            fixtures::season_with_files(0, 1, "GroupA"),
        )
        .await;
    let movies = MockMovieLibrary::new();
    movies
        .add_movie(fixtures::movie(5, "Show: The Movie", 555), vec![Some("GroupA")])
        .await;

    let special = MappingEntry {
        tvdb_season: 0,
        tmdb_movie_id: Some(555),
        ..fixtures::tvdb_mapping(1, 100, 20)
    };
    let mappings = store(vec![special]);
    let config = SyncConfig {
        ignore_movies_in_movie_library: true,
        ..fixtures::sync_config()
    };
    let mut ctx = h.context(&config);

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, Some(&movies as &dyn MovieLibrary))
        .await
        .unwrap();

    assert_eq!(summary.skipped_by(SkipReason::InMovieLibrary), 1);
    assert!(h.index.queries().await.is_empty());
}

#[tokio::test]
async fn test_tracking_metadata_is_fetched_once_per_id() {
    let h = TestHarness::new();
    let mut episodes = fixtures::season_with_files(1, 12, "GroupA");
    episodes.extend(fixtures::season_with_files(2, 12, "GroupA"));
    h.library
        .add_series(fixtures::series(1, "Show", 100), episodes)
        .await;
    h.tracking.insert(fixtures::tv_media(20, "Show", Some(12))).await;
    h.index
        .insert(fixtures::index_entry(20, vec![fixtures::nyaa_candidate("GroupA", 1)]))
        .await;

    let season_one = MappingEntry {
        tvdb_season: 1,
        ..fixtures::tvdb_mapping(1, 100, 20)
    };
    let season_two = MappingEntry {
        tvdb_season: 2,
        ..fixtures::tvdb_mapping(2, 100, 20)
    };
    let mappings = store(vec![season_one, season_two]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.matched, 2);
    assert_eq!(h.tracking.calls_for(20).await, 1);
}

#[tokio::test]
async fn test_notification_failure_does_not_change_outcome() {
    let h = TestHarness::new();
    h.single_series("GroupB").await;
    h.notifier.fail_with_status(500).await;
    h.index
        .insert(fixtures::index_entry(20, vec![fixtures::nyaa_candidate("GroupA", 1)]))
        .await;

    let mappings = store(vec![fixtures::tvdb_mapping(1, 100, 20)]);
    let mut ctx = h.context(&fixtures::sync_config());

    let summary = run_series_sync(&mut ctx, &mappings, &h.library, None)
        .await
        .unwrap();

    assert_eq!(summary.torrents_added, 1);
    assert_eq!(summary.failed, 0);
}
