//! Persisted user preferences: AI difficulty and last game mode.
//!
//! Reads never fail. A missing file, a missing key or an unreadable value
//! all fall back to the default.

use crate::ConfigError;
use misere_tictactoe::Difficulty;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

const DIFFICULTY_KEY: &str = "difficulty";
const MODE_KEY: &str = "mode";

/// Which kind of game is being played, without mode-specific data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ModeKind {
    /// One human against the computer.
    #[default]
    VsAi,
    /// Two humans sharing one device.
    LocalTwoPlayer,
    /// Two humans on linked devices.
    RemoteTwoPlayer,
}

/// Key-value settings stored as a small TOML file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored difficulty, or `Easy`.
    #[instrument(skip(self))]
    pub fn difficulty(&self) -> Difficulty {
        self.read_key(DIFFICULTY_KEY)
    }

    /// Persists the difficulty, keeping the other settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be written.
    #[instrument(skip(self))]
    pub fn set_difficulty(&self, difficulty: Difficulty) -> Result<(), ConfigError> {
        self.write_key(DIFFICULTY_KEY, difficulty.to_string())
    }

    /// Stored mode, or `VsAi`.
    #[instrument(skip(self))]
    pub fn mode(&self) -> ModeKind {
        self.read_key(MODE_KEY)
    }

    /// Persists the mode, keeping the other settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be written.
    #[instrument(skip(self))]
    pub fn set_mode(&self, mode: ModeKind) -> Result<(), ConfigError> {
        self.write_key(MODE_KEY, mode.to_string())
    }

    fn read_table(&self) -> Option<toml::Table> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No settings file");
                return None;
            }
        };
        match content.parse::<toml::Table>() {
            Ok(table) => Some(table),
            Err(e) => {
                let path = self.path.display();
                warn!(%path, error = %e, "Settings file is corrupt; using defaults");
                None
            }
        }
    }

    fn read_key<T>(&self, key: &str) -> T
    where
        T: FromStr + Default,
    {
        let Some(table) = self.read_table() else {
            return T::default();
        };
        let Some(raw) = table.get(key).and_then(|value| value.as_str()) else {
            debug!(key, "Setting not present");
            return T::default();
        };
        raw.parse().unwrap_or_else(|_| {
            warn!(key, value = raw, "Unrecognised setting; using default");
            T::default()
        })
    }

    fn write_key(&self, key: &str, value: String) -> Result<(), ConfigError> {
        let mut table = self.read_table().unwrap_or_default();
        table.insert(key.to_string(), toml::Value::String(value));

        let content = toml::to_string(&table)
            .map_err(|e| ConfigError::settings(format!("Failed to serialize settings: {}", e)))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::settings(format!("Failed to create settings directory: {}", e))
            })?;
        }
        std::fs::write(&self.path, content)
            .map_err(|e| ConfigError::settings(format!("Failed to write settings: {}", e)))?;

        info!(key, path = %self.path.display(), "Setting saved");
        Ok(())
    }
}
