use super::{
    types::{Config, LibraryKind},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - At least one tracker is allowed
/// - Sleep time is a finite, non-negative number
/// - Torrent cap, when set, is positive
/// - Mapping cache time is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.sync.trackers.iter().all(|t| t.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "sync.trackers must name at least one tracker".to_string(),
        ));
    }

    let sleep = config.sync.sleep_time_secs;
    if !sleep.is_finite() || sleep < 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "sync.sleep_time_secs must be >= 0, got {}",
            sleep
        )));
    }

    if config.sync.max_torrents_to_add == Some(0) {
        return Err(ConfigError::ValidationError(
            "sync.max_torrents_to_add cannot be 0 (omit it for no limit)".to_string(),
        ));
    }

    if config.mappings.cache_days == 0 {
        return Err(ConfigError::ValidationError(
            "mappings.cache_days cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate that the given library has usable connection settings.
pub fn validate_for_library(config: &Config, kind: LibraryKind) -> Result<(), ConfigError> {
    let library = match kind {
        LibraryKind::Sonarr => config.sonarr.as_ref(),
        LibraryKind::Radarr => config.radarr.as_ref(),
    };

    let Some(library) = library else {
        return Err(ConfigError::ValidationError(format!(
            "[{}] section is required for a {} run",
            kind, kind
        )));
    };

    if library.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!("{}.url is empty", kind)));
    }
    if library.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{}.api_key is empty",
            kind
        )));
    }

    Ok(())
}
