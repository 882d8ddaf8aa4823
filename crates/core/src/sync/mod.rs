//! Reconciliation and sync orchestration.
//!
//! A run walks one library item at a time: resolve tracking ids, look up
//! the release index, fingerprint the local files, compare with the
//! recommendation, and on mismatch dispatch (or report) the recommended
//! torrents. Everything the run needs lives in a [`RunContext`].

mod context;
mod movies;
mod reconcile;
mod series;
mod types;

pub use context::RunContext;
pub use movies::run_movie_sync;
pub use series::run_series_sync;
pub use types::*;
