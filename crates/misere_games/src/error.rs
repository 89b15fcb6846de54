//! Location-tracking error shared by the history store and the TOML files.

use derive_more::{Display, Error};
use tracing::instrument;

/// Which part of the application raised a [`LocatedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorKind {
    /// Match history database.
    Database,
    /// Application config file.
    Config,
    /// Persisted settings file.
    Settings,
}

/// Infrastructure failure, tagged with where in the source it was raised.
#[derive(Debug, Clone, Display, Error)]
#[display("{} error: {} at {}:{}", kind, message, file, line)]
pub struct LocatedError {
    /// Failing subsystem.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

/// Error from the match history store.
pub type DbError = LocatedError;

/// Error reading or writing the config or settings files.
pub type ConfigError = LocatedError;

impl LocatedError {
    /// Creates an error stamped with the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// History store failure.
    #[track_caller]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Config file failure.
    #[track_caller]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Settings file failure.
    #[track_caller]
    pub fn settings(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Settings, message)
    }
}

impl From<diesel::result::Error> for LocatedError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::database(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for LocatedError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::database(format!("Connection error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_caller_location() {
        let line = line!() + 1;
        let err = ConfigError::config("bad key");
        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.file, file!());
        assert_eq!(err.line, line);
        assert_eq!(
            err.to_string(),
            format!("Config error: bad key at {}:{}", file!(), line)
        );
    }

    #[test]
    fn test_diesel_errors_are_database_kind() {
        let err = DbError::from(diesel::result::Error::NotFound);
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.message.starts_with("Diesel error"));
    }
}
