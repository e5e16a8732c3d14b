//! Optional `config.toml` in the platform config directory.
//!
//! CLI flags override the file, which overrides the defaults here.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dates::DEFAULT_STALE_AFTER_DAYS;
use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: Option<PathBuf>,
    pub profiles_path: Option<PathBuf>,
    pub prompts_path: Option<PathBuf>,
    pub stale_after_days: i64,
    /// Seconds between board refreshes in `browse`.
    pub refresh_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            profiles_path: None,
            prompts_path: None,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            refresh_secs: 5,
        }
    }
}

impl Config {
    /// Loads `path`, or the default location when `path` is `None`.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match project_dirs() {
                Some(dirs) => (dirs.config_dir().join(CONFIG_FILE_NAME), false),
                None => return Ok(Self::default()),
            },
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        let config = Self::parse(&raw)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        if config.stale_after_days < 0 {
            return Err(Error::validation("stale_after_days must not be negative"));
        }
        if config.refresh_secs == 0 {
            return Err(Error::validation("refresh_secs must be at least 1"));
        }
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir().join("pipeline.db"))
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.profiles_path
            .clone()
            .unwrap_or_else(|| data_dir().join("profiles.json"))
    }

    pub fn prompts_path(&self) -> PathBuf {
        self.prompts_path
            .clone()
            .unwrap_or_else(|| data_dir().join("prompts.json"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "pipeline")
}

fn data_dir() -> PathBuf {
    // Use XDG data directory or fall back to the working directory
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.stale_after_days, 2);
        assert_eq!(config.refresh_secs, 5);
        assert!(config.database_path.is_none());
        assert!(config.prompts_path().ends_with("prompts.json"));
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::parse(
            r#"
            database_path = "/tmp/board.db"
            stale_after_days = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/board.db"));
        assert_eq!(config.stale_after_days, 3);
        assert_eq!(config.refresh_secs, 5);
    }

    #[test]
    fn rejects_nonsense_values() {
        assert!(Config::parse("stale_after_days = -1").is_err());
        assert!(Config::parse("refresh_secs = 0").is_err());
        assert!(matches!(
            Config::parse("stale_after_days = \"two\""),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::load(Some(&missing)), Err(Error::Io { .. })));
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_secs = 30\n").unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().refresh_secs, 30);
    }
}
