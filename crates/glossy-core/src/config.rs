//! Configuration management for the Glossy admin console

use crate::error::{Error, Result};
use crate::pagination::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Environment variable that overrides the API base URL
pub const API_URL_ENV: &str = "GLOSSY_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    #[validate(nested)]
    pub api: ApiConfig,

    /// Session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 600))]
    pub timeout_seconds: u64,

    /// Rows requested per list page
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// File holding the persisted bearer credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    std::env::var(API_URL_ENV).unwrap_or_else(|_| "http://localhost:8080/api".to_string())
}

const fn default_timeout_seconds() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            page_size: default_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl SessionConfig {
    /// Where credentials are persisted: the configured path, else the
    /// platform config directory, else the working directory.
    #[must_use]
    pub fn resolved_credentials_path(&self) -> PathBuf {
        if let Some(path) = &self.credentials_path {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "polaroid", "glossy-admin").map_or_else(
            || PathBuf::from(".glossy-credentials.json"),
            |dirs| dirs.config_dir().join("credentials.json"),
        )
    }
}

impl Config {
    /// Load configuration from `glossy-admin.*` in the working directory and
    /// `GLOSSY__*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file when given
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable or invalid.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = path.map_or_else(
            || config::File::with_name("glossy-admin").required(false),
            |path| config::File::from(path).required(true),
        );

        let mut builder = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("GLOSSY").separator("__"));

        if let Ok(base_url) = std::env::var(API_URL_ENV) {
            builder = builder.set_override("api.base_url", base_url)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every request fail
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(Error::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert!(config.api.base_url.starts_with("http"));
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.api.page_size, 20);
        assert!(config.session.credentials_path.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_partial_config_deserialization() {
        let config: Config = serde_json::from_str(
            r#"{"api": {"base_url": "https://shop.example.com/api"}, "logging": {"format": "json"}}"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://shop.example.com/api");
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_page_size_is_rejected() {
        let mut config = Config::default();
        config.api.page_size = 0;

        let error = config.check().unwrap_err();
        assert!(matches!(error, Error::Validation { .. }));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();

        assert!(config.check().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://admin.example.com/api\"\npage_size = 50\n\n[session]\ncredentials_path = \"/tmp/glossy.json\""
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.api.page_size, 50);
        assert_eq!(
            config.session.resolved_credentials_path(),
            PathBuf::from("/tmp/glossy.json")
        );
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let result = Config::load_from(Some(Path::new("/nonexistent/glossy-admin.toml")));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_default_credentials_path_is_a_json_file() {
        let path = SessionConfig::default().resolved_credentials_path();
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("json"));
    }
}
