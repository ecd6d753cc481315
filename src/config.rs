//! Pilot configuration.
//!
//! Loaded from `~/.pilot/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{navigator::RecordMode, storage::ProgressStore};

/// Pilot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Workspace-relative directories searched for tours besides the
    /// standard ones. The first also receives new tours.
    pub tour_directories: Vec<String>,

    /// How steps recorded at a line are anchored.
    pub record_mode: RecordMode,

    /// Quiet period before tours rewritten by the pattern tracker are saved.
    pub persist_debounce_ms: u64,

    /// Where progress is kept. Defaults to `~/.pilot/progress.sqlite`.
    pub progress_db: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tour_directories: Vec::new(),
            record_mode: RecordMode::default(),
            persist_debounce_ms: 5000,
            progress_db: None,
        }
    }
}

impl Config {
    /// Load config from `~/.pilot/config.toml`, or defaults if there is none.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.pilot/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pilot").join("config.toml"))
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    /// The progress database to use.
    pub fn progress_db_path(&self) -> Option<PathBuf> {
        self.progress_db.clone().or_else(ProgressStore::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.persist_debounce(), Duration::from_secs(5));
    }

    #[test]
    fn reads_kebab_case_keys() {
        let (_dir, path) = write_config(
            r#"
tour-directories = ["docs/tours"]
record-mode = "pattern"
persist-debounce-ms = 250
progress-db = "/tmp/pilot.sqlite"
"#,
        );

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.tour_directories, ["docs/tours"]);
        assert_eq!(config.record_mode, RecordMode::Pattern);
        assert_eq!(config.persist_debounce(), Duration::from_millis(250));
        assert_eq!(config.progress_db_path(), Some(PathBuf::from("/tmp/pilot.sqlite")));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_dir, path) = write_config("record-mode = \"line\"\n");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.persist_debounce_ms, 5000);
        assert!(config.tour_directories.is_empty());
    }

    #[test]
    fn invalid_values_are_reported_with_path() {
        let (_dir, path) = write_config("record-mode = \"guess\"\n");
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains("invalid config"));
        assert!(err.contains("config.toml"));

        let (_dir, path) = write_config("unknown-key = 1\n");
        assert!(Config::load_from(&path).is_err());
    }
}
