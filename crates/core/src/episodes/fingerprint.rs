use std::collections::BTreeSet;

use crate::library::Episode;

/// Distinct release groups held locally for one title or episode window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalReleaseFingerprint {
    pub groups: BTreeSet<String>,
    /// In-window episodes without a file.
    pub missing_episodes: usize,
    pub total_episodes: usize,
}

impl LocalReleaseFingerprint {
    /// Fingerprint of a series episode window.
    pub fn from_episodes(window: &[Episode]) -> Self {
        let mut groups = BTreeSet::new();
        let mut missing_episodes = 0;

        for ep in window {
            if !ep.has_file {
                missing_episodes += 1;
                continue;
            }
            if let Some(group) = &ep.release_group {
                groups.insert(group.clone());
            }
        }

        Self {
            groups,
            missing_episodes,
            total_episodes: window.len(),
        }
    }

    /// Fingerprint of a movie with at most one file.
    pub fn from_movie(release_group: Option<String>) -> Self {
        Self {
            groups: release_group.into_iter().collect(),
            missing_episodes: 0,
            total_episodes: 1,
        }
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Comma-separated groups, for logs and notifications.
    pub fn describe(&self) -> String {
        if self.groups.is_empty() {
            return "none".to_string();
        }
        self.groups.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
