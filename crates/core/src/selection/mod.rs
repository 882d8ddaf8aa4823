//! Release selection engine and group choice strategies.

mod engine;
mod strategy;

pub use engine::{
    select_recommended_releases, tracker_allowed, RecommendedReleaseSet, RecommendedTorrent,
    SelectionPreferences,
};
pub use strategy::{AutoSelection, InteractiveSelection, SelectionStrategy};
