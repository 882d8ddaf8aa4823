use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `RELSYNC_SONARR__API_KEY`.
pub const ENV_PREFIX: &str = "RELSYNC_";

/// Read `path` and layer `RELSYNC_*` environment variables on top.
///
/// Nested keys are separated with `__` so that field names containing a
/// single underscore (`api_key`, `max_torrents_to_add`) stay intact.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract::<Config>()
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
}

/// Parse a TOML document without consulting the environment.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.sonarr.is_none());
        assert!(config.qbittorrent.is_none());
        assert_eq!(config.sync.max_torrents_to_add, None);
    }

    #[test]
    fn test_cap_is_read() {
        let config = load_config_from_str("[sync]\nmax_torrents_to_add = 3\n").unwrap();
        assert_eq!(config.sync.max_torrents_to_add, Some(3));
    }

    #[test]
    fn test_wrong_type_is_a_parse_error() {
        let result = load_config_from_str("[sync]\npublic_only = \"sometimes\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/nonexistent/relsync.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_directory_is_not_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path());
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_reads_library_section_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[sonarr]\nurl = \"http://127.0.0.1:8989\"\napi_key = \"abc\"\n\n[sync]\nsleep_time_secs = 0.0\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        let sonarr = config.sonarr.unwrap();
        assert_eq!(sonarr.url, "http://127.0.0.1:8989");
        assert_eq!(sonarr.api_key, "abc");
        assert_eq!(config.sync.sleep_time_secs, 0.0);
    }
}
