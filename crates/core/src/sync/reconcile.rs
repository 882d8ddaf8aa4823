//! Compare a local fingerprint with the index recommendation and act on it.

use tracing::{debug, info, warn};

use crate::config::LibraryKind;
use crate::episodes::LocalReleaseFingerprint;
use crate::metrics;
use crate::notify::{Notification, NotificationField};
use crate::release_index::ReleaseIndexEntry;
use crate::selection::{select_recommended_releases, RecommendedReleaseSet};
use crate::tracking::MediaInfo;

use super::context::RunContext;
use super::types::{ItemError, ItemOutcome, SkipReason};

/// One tracking-id match ready to be reconciled.
pub(crate) struct MatchInput<'a> {
    pub library: LibraryKind,
    pub title: &'a str,
    pub media: &'a MediaInfo,
    pub entry: &'a ReleaseIndexEntry,
    pub local: &'a LocalReleaseFingerprint,
}

fn library_label(kind: LibraryKind) -> &'static str {
    match kind {
        LibraryKind::Sonarr => "Sonarr",
        LibraryKind::Radarr => "Radarr",
    }
}

fn describe_recommendation(set: &RecommendedReleaseSet) -> String {
    set.group_names()
        .map(|group| {
            let mut trackers: Vec<&str> = set
                .group(group)
                .into_iter()
                .flatten()
                .map(|t| t.tracker.as_str())
                .collect();
            trackers.dedup();
            format!("{} ({})", group, trackers.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_notification(input: &MatchInput<'_>, set: &RecommendedReleaseSet) -> Notification {
    let mut fields = vec![
        NotificationField::new(
            format!("{} release(s)", library_label(input.library)),
            input.local.describe(),
        ),
        NotificationField::new("Recommended release(s)", describe_recommendation(set)),
    ];
    if let Some(notes) = &input.entry.notes {
        fields.push(NotificationField::new("Notes", notes.clone()));
    }
    if input.entry.incomplete {
        fields.push(NotificationField::new(
            "Index entry",
            "Marked incomplete, better releases may follow",
        ));
    }
    if let Some(site_url) = &input.media.site_url {
        fields.push(NotificationField::new("AniList", site_url.clone()));
    }

    Notification {
        title: input.title.to_string(),
        subtitle: input.media.title.clone(),
        url: Some(input.entry.url.clone()),
        fields,
        thumbnail_url: input.media.thumbnail_url.clone(),
    }
}

impl RunContext {
    /// Select, compare and, on mismatch, dispatch or report.
    pub(crate) async fn reconcile(
        &mut self,
        input: MatchInput<'_>,
    ) -> Result<ItemOutcome, ItemError> {
        let mut recommendation =
            select_recommended_releases(&input.entry.torrents, &self.preferences);

        if recommendation.is_empty() {
            info!(title = %input.title, tracking_id = input.media.id, "No suitable releases in the index");
            return Ok(ItemOutcome::skipped(SkipReason::NoSuitableRelease));
        }

        debug!(
            local = %input.local.describe(),
            recommended = %recommendation.group_names().collect::<Vec<_>>().join(", "),
            "Comparing release groups"
        );

        if recommendation.len() > 1 {
            recommendation = self.strategy.choose(input.title, recommendation);
        }

        if recommendation.matches(input.local) {
            info!(title = %input.title, "Already have the recommended release");
            return Ok(ItemOutcome::Matched);
        }

        info!(
            title = %input.title,
            tracking_id = input.media.id,
            local = %input.local.describe(),
            recommended = %recommendation.group_names().collect::<Vec<_>>().join(", "),
            "Local release does not match the recommendation"
        );

        let notification = build_notification(&input, &recommendation);

        let dispatcher = if self.dry_run {
            None
        } else {
            self.dispatcher.as_ref()
        };

        let (added, would_add) = match dispatcher {
            Some(dispatcher) => {
                match dispatcher
                    .dispatch(
                        &recommendation,
                        &self.preferences.allowed_trackers,
                        &mut self.counter,
                    )
                    .await
                {
                    Ok(report) => (report.added_count() as u32, 0),
                    Err(partial) => {
                        // Whatever reached the client before the failure is still announced.
                        if partial.report.added_count() > 0 {
                            self.notify(input.title, &notification).await;
                        }
                        return Err(partial.into());
                    }
                }
            }
            None => {
                // Report-only runs still count toward the cap.
                let groups = recommendation.len() as u32;
                self.counter.record_added(groups);
                info!(title = %input.title, groups, "Would add recommended release(s)");
                (0, groups)
            }
        };

        if added + would_add > 0 {
            self.notify(input.title, &notification).await;
        }

        Ok(ItemOutcome::Mismatched { added, would_add })
    }

    async fn notify(&self, title: &str, notification: &Notification) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.post(notification).await {
            metrics::NOTIFICATION_FAILURES.inc();
            warn!(title = %title, error = %e, "Failed to post notification");
        }
    }
}
