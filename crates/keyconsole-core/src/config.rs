//! Configuration management for the key console

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding configuration values
pub const ENV_PREFIX: &str = "KEYCONSOLE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Session token storage
    #[serde(default)]
    pub session: SessionConfig,

    /// Console behaviour
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without the API prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Prefix of the versioned REST API
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Where the bearer token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    /// JSON file on disk
    File,
    /// Process memory only
    Memory,
}

/// Session token storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed key the token is stored under
    #[serde(default = "default_token_key")]
    pub token_key: String,

    /// Storage backend
    #[serde(default = "default_store")]
    pub store: TokenStoreKind,

    /// Session file, defaults to the platform config directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Console behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Initial rows per page
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Page sizes offered by the page-size selector
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<u32>,

    /// How long transient notifications stay visible
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,
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

    /// Log to file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_token_key() -> String {
    "access_token".to_string()
}

const fn default_store() -> TokenStoreKind {
    TokenStoreKind::File
}

const fn default_page_size() -> u32 {
    crate::types::DEFAULT_PAGE_SIZE
}

fn default_page_size_options() -> Vec<u32> {
    vec![10, 20, 50]
}

const fn default_notification_duration_ms() -> u64 {
    2000
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
            api_prefix: default_api_prefix(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: default_token_key(),
            store: default_store(),
            path: None,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            page_size_options: default_page_size_options(),
            notification_duration_ms: default_notification_duration_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl ApiConfig {
    /// Absolute URL of a path under the versioned API prefix
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/'),
            path
        )
    }
}

impl SessionConfig {
    /// Resolved session file location
    pub fn resolved_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        directories::ProjectDirs::from("dev", "keyconsole", "keyconsole")
            .map(|dirs| dirs.config_dir().join("session.json"))
            .ok_or(crate::Error::NoConfigDir)
    }
}

impl Config {
    /// Load configuration from `keyconsole.toml` (or `path`) and `KEYCONSOLE__*` variables
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let file = path.map_or_else(
            || config::File::with_name("keyconsole").required(false),
            |path| config::File::from(path).required(true),
        );

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(
            base_url = %config.api.base_url,
            store = ?config.session.store,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first violated constraint.
    pub fn validate(&self) -> crate::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::Error::setting("api.base_url", "must not be empty"));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(crate::Error::setting(
                "api.base_url",
                "must start with http:// or https://",
            ));
        }
        if self.session.token_key.trim().is_empty() {
            return Err(crate::Error::setting("session.token_key", "must not be empty"));
        }
        if self.console.page_size_options.is_empty() {
            return Err(crate::Error::setting(
                "console.page_size_options",
                "must not be empty",
            ));
        }
        if self.console.page_size_options.contains(&0) || self.console.default_page_size == 0 {
            return Err(crate::Error::setting("console", "page sizes must be positive"));
        }
        Ok(())
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

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.api_prefix, "/api/v1");
        assert_eq!(config.api.request_timeout, 30);

        assert_eq!(config.session.token_key, "access_token");
        assert_eq!(config.session.store, TokenStoreKind::File);
        assert!(config.session.path.is_none());

        assert_eq!(config.console.default_page_size, 10);
        assert_eq!(config.console.page_size_options, vec![10, 20, 50]);
        assert_eq!(config.console.notification_duration_ms, 2000);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert!(config.logging.file.is_none());

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_url_joins_without_double_slashes() {
        let api = ApiConfig {
            base_url: "https://keys.example.com/".to_string(),
            api_prefix: "/api/v1/".to_string(),
            request_timeout: 5,
        };

        assert_eq!(
            api.api_url("/api-keys/batch"),
            "https://keys.example.com/api/v1/api-keys/batch"
        );
    }

    #[test]
    fn test_partial_config_deserialization() {
        let toml_str = r#"
            [api]
            base_url = "https://keys.internal"

            [session]
            store = "memory"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://keys.internal");
        assert_eq!(config.api.api_prefix, "/api/v1");
        assert_eq!(config.session.store, TokenStoreKind::Memory);
        assert_eq!(config.console.default_page_size, 10);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[console]\ndefault_page_size = 20\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.console.default_page_size, 20);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_validation_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "keys.example.com".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_validation_rejects_zero_page_size() {
        let mut config = Config::default();
        config.console.page_size_options = vec![10, 0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_session_path_wins() {
        let session = SessionConfig {
            path: Some(PathBuf::from("/tmp/keyconsole-session.json")),
            ..SessionConfig::default()
        };
        assert_eq!(
            session.resolved_path().unwrap(),
            PathBuf::from("/tmp/keyconsole-session.json")
        );
    }
}
