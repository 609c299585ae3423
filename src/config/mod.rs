//! Configuration management for qrpages
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `.env` file
//! 4. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use qrpages::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Publishing to {}/{}", config.github.owner, config.github.repo);
//! ```
//!
//! # Environment Variables
//!
//! Any setting can be overridden with `QRPAGES__<section>__<key>`:
//! - `QRPAGES__GITHUB__OWNER=octocat`
//! - `QRPAGES__GITHUB__BRANCH=gh-pages`
//! - `QRPAGES__CORS__ALLOWED_ORIGINS=https://a.example,https://b.example`
//!
//! The access token is only read from `GITHUB_TOKEN` (or `MY_GITHUB_TOKEN`).
//!
//! # Configuration File
//!
//! By default the file is `config/qrpages.toml`; `QRPAGES_CONFIG` points elsewhere.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, CorsConfig, EcLevel, GitHubConfig, PublishConfig, QrConfig, ServerConfig,
    UrlRules,
};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], reading the TOML layer from `path` when given.
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, without secrets
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[github]\nowner = \"octocat\"\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.github.owner, "octocat");
        assert_eq!(config.github.repo, "qr-codes-repo");
    }

    #[test]
    fn test_validation_catches_missing_owner() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[github]\nrepo = \"codes\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::MissingGitHubField { field: "owner" })
        ));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[qr]\nmodule_size = \"large\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }
}
