//! Application configuration.

use crate::ConfigError;
use crate::peer::{RetryPolicy, TransportKind};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Runtime configuration, read from a TOML file. Every key is optional.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file holding match history.
    #[serde(default = "default_history_db")]
    history_db: String,

    /// TOML file holding persisted settings.
    #[serde(default = "default_settings_path")]
    settings_path: PathBuf,

    /// Address a host binds to.
    #[serde(default = "default_listen_addr")]
    listen_addr: String,

    /// Pause before the AI answers, in milliseconds.
    #[serde(default = "default_ai_delay_ms")]
    ai_delay_ms: u64,

    /// Connection attempts a joining client makes.
    #[serde(default = "default_connect_attempts")]
    connect_attempts: u32,

    /// Pause between connection attempts, in milliseconds.
    #[serde(default = "default_connect_delay_ms")]
    connect_delay_ms: u64,

    /// Peer transport backing.
    #[serde(default)]
    transport: TransportKind,
}

fn default_history_db() -> String {
    "misere_history.db".to_string()
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("misere_settings.toml")
}

fn default_listen_addr() -> String {
    "0.0.0.0:47474".to_string()
}

fn default_ai_delay_ms() -> u64 {
    1000
}

fn default_connect_attempts() -> u32 {
    30
}

fn default_connect_delay_ms() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_db: default_history_db(),
            settings_path: default_settings_path(),
            listen_addr: default_listen_addr(),
            ai_delay_ms: default_ai_delay_ms(),
            connect_attempts: default_connect_attempts(),
            connect_delay_ms: default_connect_delay_ms(),
            transport: TransportKind::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::config(format!("Failed to parse config: {}", e)))?;

        info!(history_db = %config.history_db, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file; using defaults");
            Ok(Self::default())
        }
    }

    /// AI pause as a duration.
    pub fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.ai_delay_ms)
    }

    /// Client retry behaviour.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_attempts,
            Duration::from_millis(self.connect_delay_ms),
        )
    }
}
