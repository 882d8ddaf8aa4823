//! Episode windowing and local release fingerprints.

mod fingerprint;
mod window;

pub use fingerprint::LocalReleaseFingerprint;
pub use window::{resolve_episode_window, TV_FORMAT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EpisodeWindowError {
    #[error("episode mapping inconsistency: {0}")]
    DataInconsistency(String),
}
