//! Configuration management for chirp

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub messages_url: String,
    pub media_upload_url: String,
    pub identity_url: String,
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub rate_limit_interval_secs: u64,
    pub rate_limit_burst: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub credentials_path: String,
    pub key_path: String,
    pub log_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            messages_url: "https://api.x.com/2/tweets".to_string(),
            media_upload_url: "https://upload.twitter.com/1.1/media/upload.json".to_string(),
            identity_url: "https://api.x.com/2/users/me".to_string(),
            request_token_url: "https://api.twitter.com/oauth/request_token".to_string(),
            authorize_url: "https://api.twitter.com/oauth/authorize".to_string(),
            access_token_url: "https://api.twitter.com/oauth/access_token".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_limit_interval_secs: 15,
            rate_limit_burst: 1,
            request_timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_path: "~/.config/chirp/credentials.toml".to_string(),
            key_path: "~/.config/chirp/credentials.key".to_string(),
            log_path: "~/.local/share/chirp/chirp.log".to_string(),
        }
    }
}

impl LimitsConfig {
    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageConfig {
    pub fn credentials_path(&self) -> PathBuf {
        expand(&self.credentials_path)
    }

    pub fn key_path(&self) -> PathBuf {
        expand(&self.key_path)
    }

    pub fn log_path(&self) -> PathBuf {
        expand(&self.log_path)
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error: chirp runs on defaults until the user
    /// writes a config.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_or_default(&config_path)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Write configuration to `path`, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::ReadError)?;
        }
        let content = toml::to_string_pretty(self).map_err(ConfigError::WriteError)?;
        std::fs::write(path, content).map_err(ConfigError::ReadError)?;
        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHIRP_CONFIG") {
        return Ok(expand(&path));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("chirp").join("config.toml"))
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_service_limits() {
        let config = Config::default();
        assert_eq!(config.limits.rate_limit_interval(), Duration::from_secs(15));
        assert_eq!(config.limits.rate_limit_burst, 1);
        assert_eq!(config.limits.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.api.messages_url, "https://api.x.com/2/tweets");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_or_default(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[limits]\nrequest_timeout_secs = 5\n\n[api]\nmessages_url = \"http://localhost/post\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.limits.request_timeout_secs, 5);
        assert_eq!(config.limits.rate_limit_interval_secs, 15);
        assert_eq!(config.api.messages_url, "http://localhost/post");
        assert_eq!(config.api.identity_url, "https://api.x.com/2/users/me");
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[limits\nnot toml").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ChirpError::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.limits.rate_limit_interval_secs = 60;

        config.save_to_path(&path).unwrap();
        assert_eq!(Config::load_from_path(&path).unwrap(), config);
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        std::env::set_var("CHIRP_CONFIG", "/tmp/chirp-test/config.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("CHIRP_CONFIG");
        assert_eq!(path, PathBuf::from("/tmp/chirp-test/config.toml"));
    }
}
