use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "QRPAGES_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/qrpages.toml";
const ENV_PREFIX: &str = "QRPAGES";
const ENV_SEPARATOR: &str = "__";
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "MY_GITHUB_TOKEN"];

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // A missing .env is not an error
    let _ = dotenvy::dotenv();

    let config_path = path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are never read from TOML files, only from the environment
fn load_secrets(config: &mut Config) {
    config.github.token = TOKEN_ENV_VARS
        .iter()
        .find_map(|name| env::var(name).ok())
        .filter(|token| !token.trim().is_empty());
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // QRPAGES__GITHUB__OWNER -> github.owner
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("cors.allowed_origins")
            .with_list_parse_key("validation.allowed_schemes"),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EcLevel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.github.repo, "qr-codes-repo");
        assert_eq!(config.github.branch, "main");
        assert_eq!(config.publish.directory, "qr_codes");
        assert_eq!(config.qr.ec_level, EcLevel::L);
        assert_eq!(config.qr.module_size, 10);
        assert_eq!(config.qr.border, 4);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert!(config.github.token.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"

[github]
owner = "octocat"
repo = "codes"
branch = "gh-pages"
committer_name = "QR Bot"
committer_email = "qr-bot@example.com"

[publish]
directory = "images/qr"

[qr]
ec_level = "H"
module_size = 6
border = 2

[cors]
allowed_origins = ["https://octocat.github.io"]
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.github.owner, "octocat");
        assert_eq!(config.github.repo, "codes");
        assert_eq!(config.github.branch, "gh-pages");
        assert_eq!(config.github.committer_name.as_deref(), Some("QR Bot"));
        assert_eq!(config.publish.directory, "images/qr");
        assert_eq!(config.qr.ec_level, EcLevel::H);
        assert_eq!(config.qr.module_size, 6);
        assert_eq!(config.qr.border, 2);
        assert_eq!(config.cors.allowed_origins, vec!["https://octocat.github.io"]);
        // Untouched sections keep their defaults
        assert_eq!(config.validation.allowed_schemes, vec!["http", "https"]);
    }

    #[test]
    fn test_token_is_not_read_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[github]\nowner = \"octocat\"\ntoken = \"ghp_leaked\"\n").unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert!(config.github.token.is_none());
    }
}
