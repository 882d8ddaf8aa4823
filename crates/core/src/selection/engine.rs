//! Release selection: candidate torrents in, recommended groups out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::episodes::LocalReleaseFingerprint;
use crate::release_index::ReleaseCandidate;

/// Filter preferences applied by `select_recommended_releases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPreferences {
    /// Hard allow-list, compared case-insensitively.
    pub allowed_trackers: Vec<String>,
    pub public_only: bool,
    pub want_best: bool,
    pub prefer_dual_audio: bool,
}

impl SelectionPreferences {
    pub fn tracker_allowed(&self, tracker: &str) -> bool {
        tracker_allowed(&self.allowed_trackers, tracker)
    }
}

impl From<&SyncConfig> for SelectionPreferences {
    fn from(config: &SyncConfig) -> Self {
        Self {
            allowed_trackers: config.trackers.clone(),
            public_only: config.public_only,
            want_best: config.want_best,
            prefer_dual_audio: config.prefer_dual_audio,
        }
    }
}

/// Case-insensitive allow-list check.
pub fn tracker_allowed(allowed: &[String], tracker: &str) -> bool {
    let tracker = tracker.trim();
    allowed.iter().any(|t| t.trim().eq_ignore_ascii_case(tracker))
}

/// One torrent of a recommended group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedTorrent {
    pub url: String,
    pub tracker: String,
    pub hash: String,
}

/// Release group -> (page URL -> torrent).
///
/// Backed by ordered maps, so equality and iteration order do not depend on
/// candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedReleaseSet {
    groups: BTreeMap<String, BTreeMap<String, RecommendedTorrent>>,
}

impl RecommendedReleaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a torrent; a repeated URL in the same group replaces the earlier one.
    pub fn insert(&mut self, group: &str, torrent: RecommendedTorrent) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(torrent.url.clone(), torrent);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of release groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Number of torrents across all groups.
    pub fn torrent_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Torrents of one group, ordered by URL.
    pub fn group(&self, group: &str) -> Option<impl Iterator<Item = &RecommendedTorrent>> {
        self.groups.get(group).map(|urls| urls.values())
    }

    /// Every (group, torrent) pair.
    pub fn torrents(&self) -> impl Iterator<Item = (&str, &RecommendedTorrent)> {
        self.groups
            .iter()
            .flat_map(|(g, urls)| urls.values().map(move |t| (g.as_str(), t)))
    }

    /// Set reduced to one group.
    pub fn only_group(&self, group: &str) -> Self {
        let groups = self
            .groups
            .iter()
            .filter(|(g, _)| g.as_str() == group)
            .map(|(g, urls)| (g.clone(), urls.clone()))
            .collect();
        Self { groups }
    }

    /// Whether any locally held group is recommended.
    pub fn matches(&self, local: &LocalReleaseFingerprint) -> bool {
        local.groups.iter().any(|g| self.groups.contains_key(g))
    }
}

/// Keep the subset satisfying `pred`, unless that subset would be empty.
fn prefer<'a>(
    working: Vec<&'a ReleaseCandidate>,
    pred: impl Fn(&ReleaseCandidate) -> bool,
) -> Vec<&'a ReleaseCandidate> {
    let subset: Vec<&ReleaseCandidate> = working.iter().copied().filter(|c| pred(c)).collect();
    if subset.is_empty() {
        working
    } else {
        subset
    }
}

/// Run the filter pipeline and group the survivors.
///
/// 1. tracker allow-list (hard)
/// 2. public trackers, if `public_only` (fallback-safe)
/// 3. curator "best" flag, if `want_best` (fallback-safe)
/// 4. dual audio, if `prefer_dual_audio` (fallback-safe)
pub fn select_recommended_releases(
    candidates: &[ReleaseCandidate],
    prefs: &SelectionPreferences,
) -> RecommendedReleaseSet {
    let mut working: Vec<&ReleaseCandidate> = candidates
        .iter()
        .filter(|c| prefs.tracker_allowed(&c.tracker))
        .collect();

    if prefs.public_only {
        working = prefer(working, |c| c.is_public);
    }
    if prefs.want_best {
        working = prefer(working, |c| c.is_best);
    }
    if prefs.prefer_dual_audio {
        working = prefer(working, |c| c.is_dual_audio);
    }

    let mut set = RecommendedReleaseSet::new();
    for c in working {
        set.insert(
            &c.release_group,
            RecommendedTorrent {
                url: c.url.clone(),
                tracker: c.tracker.clone(),
                hash: c.infohash.clone(),
            },
        );
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(trackers: &[&str]) -> SelectionPreferences {
        SelectionPreferences {
            allowed_trackers: trackers.iter().map(|t| t.to_string()).collect(),
            public_only: true,
            want_best: true,
            prefer_dual_audio: true,
        }
    }

    fn nyaa(group: &str, id: u32) -> ReleaseCandidate {
        ReleaseCandidate::new(
            group,
            "Nyaa",
            &format!("https://nyaa.si/view/{}", id),
            &format!("hash{}", id),
        )
    }

    #[test]
    fn test_best_filter_noop_without_best() {
        let candidates = vec![nyaa("A", 1), nyaa("B", 2)];
        let mut p = prefs(&["Nyaa"]);
        let with_best = select_recommended_releases(&candidates, &p);
        p.want_best = false;
        let without_best = select_recommended_releases(&candidates, &p);

        assert_eq!(with_best, without_best);
        assert_eq!(with_best.len(), 2);
    }

    #[test]
    fn test_allow_list_is_hard() {
        let candidates = vec![nyaa("A", 1).best().dual_audio(), nyaa("B", 2).best()];
        let set = select_recommended_releases(&candidates, &prefs(&["AnimeTosho"]));
        assert!(set.is_empty());
    }

    #[test]
    fn test_allow_list_case_insensitive() {
        let candidates = vec![nyaa("A", 1)];
        let set = select_recommended_releases(&candidates, &prefs(&["nyaa"]));
        assert!(set.contains_group("A"));
    }

    #[test]
    fn test_selection_is_order_independent() {
        let candidates = vec![nyaa("A", 1).best(), nyaa("B", 2).best(), nyaa("A", 3).best()];
        let mut reversed = candidates.clone();
        reversed.reverse();

        let p = prefs(&["Nyaa"]);
        let first = select_recommended_releases(&candidates, &p);
        assert_eq!(first, select_recommended_releases(&candidates, &p));
        assert_eq!(first, select_recommended_releases(&reversed, &p));
    }

    #[test]
    fn test_best_then_dual_audio() {
        let candidates = vec![
            nyaa("Plain", 1),
            nyaa("Best", 2).best(),
            nyaa("BestDual", 3).best().dual_audio(),
            nyaa("Dual", 4).dual_audio(),
        ];
        let set = select_recommended_releases(&candidates, &prefs(&["Nyaa"]));
        assert_eq!(set.group_names().collect::<Vec<_>>(), vec!["BestDual"]);
    }

    #[test]
    fn test_dual_audio_fallback() {
        let candidates = vec![nyaa("A", 1).best(), nyaa("B", 2).best()];
        let set = select_recommended_releases(&candidates, &prefs(&["Nyaa"]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_public_only_prefers_public() {
        let private = ReleaseCandidate::new("P", "AB", "https://ab/1", "p1").best();
        let candidates = vec![private.clone(), nyaa("A", 1)];
        let set = select_recommended_releases(&candidates, &prefs(&["Nyaa", "AB"]));
        // The private torrent is dropped before the best flag is considered.
        assert_eq!(set.group_names().collect::<Vec<_>>(), vec!["A"]);

        let only_private = vec![private];
        let set = select_recommended_releases(&only_private, &prefs(&["Nyaa", "AB"]));
        assert!(set.contains_group("P"));
    }

    #[test]
    fn test_group_merges_urls_and_dedupes() {
        let candidates = vec![
            nyaa("A", 1),
            nyaa("A", 2),
            ReleaseCandidate::new("A", "Nyaa", "https://nyaa.si/view/1", "newer"),
        ];
        let set = select_recommended_releases(&candidates, &prefs(&["Nyaa"]));
        assert_eq!(set.len(), 1);
        assert_eq!(set.torrent_count(), 2);
        let hashes: Vec<&str> = set.torrents().map(|(_, t)| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["newer", "hash2"]);
    }

    #[test]
    fn test_empty_candidates() {
        let set = select_recommended_releases(&[], &prefs(&["Nyaa"]));
        assert!(set.is_empty());
    }

    #[test]
    fn test_matches_fingerprint() {
        let set = select_recommended_releases(&[nyaa("GroupA", 1)], &prefs(&["Nyaa"]));
        let local_a = LocalReleaseFingerprint::from_movie(Some("GroupA".to_string()));
        let local_b = LocalReleaseFingerprint::from_movie(Some("GroupB".to_string()));
        assert!(set.matches(&local_a));
        assert!(!set.matches(&local_b));
        assert!(!set.matches(&LocalReleaseFingerprint::default()));
    }

    #[test]
    fn test_only_group() {
        let set = select_recommended_releases(&[nyaa("A", 1), nyaa("B", 2)], &prefs(&["Nyaa"]));
        let b = set.only_group("B");
        assert_eq!(b.group_names().collect::<Vec<_>>(), vec!["B"]);
        assert!(set.only_group("missing").is_empty());
    }
}
