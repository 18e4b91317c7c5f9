//! User configuration settings
//!
//! Layered configuration: defaults → config file → environment variables

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::git::{CaseSensitivity, RepositoryOptions, DEFAULT_GIT_PROGRAM};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TREESTATE_";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Git binary to run
    pub git_program: String,

    /// Report force-added ignored files as `ignored_staged`
    pub ignored_staged_check: bool,

    /// Force case sensitivity instead of probing the filesystem
    pub case_sensitive: Option<bool>,

    /// Enable debug logging
    pub debug: bool,

    /// Log file path (if set, logs to file instead of stderr)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_program: DEFAULT_GIT_PROGRAM.to_string(),
            ignored_staged_check: true,
            case_sensitive: None,
            debug: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default config file and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration using `path` as the config file
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()).into())
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            // a missing file is simply skipped
            .merge(Toml::file(path))
            // TREESTATE_GIT_PROGRAM, TREESTATE_DEBUG, ...
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Save current configuration to the default config file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save current configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// Forced case sensitivity, if configured
    pub fn case_sensitivity(&self) -> Option<CaseSensitivity> {
        self.case_sensitive.map(CaseSensitivity::from_flag)
    }

    /// Options for opening a [`Repository`](crate::git::Repository)
    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            git_program: self.git_program.clone(),
            ignored_staged_check: self.ignored_staged_check,
            case_sensitivity: self.case_sensitivity(),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "treestate", "treestate").ok_or_else(|| {
            Error::Config(ConfigError::LoadFailed(
                "Could not determine home directory".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.git_program, "git");
        assert!(config.ignored_staged_check);
        assert_eq!(config.case_sensitive, None);
        assert!(!config.debug);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("git_program"));
        assert!(toml.contains("ignored_staged_check = true"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let figment = Config::figment(&temp.path().join("absent.toml"));
        let config: Config = figment.extract().unwrap();
        assert_eq!(config.git_program, Config::default().git_program);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        let config = Config {
            git_program: "/opt/git/bin/git".into(),
            ignored_staged_check: false,
            case_sensitive: Some(false),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded: Config = Config::figment(&path).extract().unwrap();
        assert_eq!(loaded.git_program, "/opt/git/bin/git");
        assert!(!loaded.ignored_staged_check);
        assert_eq!(loaded.case_sensitivity(), Some(CaseSensitivity::Insensitive));
    }

    #[test]
    fn test_repository_options() {
        let config = Config {
            case_sensitive: Some(true),
            ..Config::default()
        };
        let options = config.repository_options();
        assert_eq!(options.git_program, "git");
        assert!(options.ignored_staged_check);
        assert_eq!(options.case_sensitivity, Some(CaseSensitivity::Sensitive));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "debug = true\n").unwrap();

        let loaded: Config = Config::figment(&path).extract().unwrap();
        assert!(loaded.debug);
        assert!(loaded.ignored_staged_check);
    }
}
