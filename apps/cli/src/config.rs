//! CLI configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the session identity is persisted between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// JSON file under the user config directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Process memory only; forgotten on exit
    Memory,
}

impl std::str::FromStr for SessionBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(SessionBackend::File),
            "keyring" | "keychain" => Ok(SessionBackend::Keyring),
            "memory" => Ok(SessionBackend::Memory),
            other => Err(ConfigError::Invalid(format!(
                "unknown session backend '{other}'"
            ))),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// News API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Session identity backend
    #[serde(default)]
    pub session_backend: SessionBackend,

    /// Session file used by the file backend
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    news_api::DEFAULT_BASE_URL.to_string()
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snooze")
        .join("session.json")
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_backend: SessionBackend::default(),
            session_file: default_session_file(),
            request_timeout_secs: default_request_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl CliConfig {
    /// Load configuration from an optional config file and the environment.
    ///
    /// Environment variables take precedence over the file.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let mut config = match Self::find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Override fields from `SNOOZE_*` variables returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SNOOZE_BASE_URL") {
            self.base_url = url;
        }

        if let Some(backend) = lookup("SNOOZE_SESSION_BACKEND") {
            self.session_backend = backend.parse()?;
        }

        if let Some(path) = lookup("SNOOZE_SESSION_FILE") {
            self.session_file = PathBuf::from(path);
        }

        if let Some(timeout) = lookup("SNOOZE_REQUEST_TIMEOUT") {
            self.request_timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!("SNOOZE_REQUEST_TIMEOUT must be seconds, got '{timeout}'"))
            })?;
        }

        if let Some(level) = lookup("SNOOZE_LOG_LEVEL") {
            self.log_level = level;
        }

        Ok(())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let locations = [
            Some(PathBuf::from("snooze.toml")),
            dirs::config_dir().map(|p| p.join("snooze").join("config.toml")),
        ];

        locations.into_iter().flatten().find(|p| p.exists())
    }

    /// Request timeout, if any. Zero disables it.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
