//! Append-only store of finished games.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, GameResult, NewGameResult, schema};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite-backed match history.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    db_path: String,
}

impl HistoryRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// The file is opened lazily per operation. Call
    /// [`HistoryRepository::run_migrations`] once before first use.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Self {
        info!(path = %db_path, "Creating HistoryRepository");
        Self { db_path }
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path).map_err(|e| {
            DbError::database(format!("Failed to connect to '{}': {}", self.db_path, e))
        })
    }

    /// Applies any pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::database(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Appends a finished game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, record), fields(winner = %record.winner(), mode = %record.mode()))]
    pub fn append(&self, record: NewGameResult) -> Result<GameResult, DbError> {
        debug!("Recording game result");
        let mut conn = self.connection()?;

        let stored = diesel::insert_into(schema::game_results::table)
            .values(&record)
            .returning(GameResult::as_returning())
            .get_result(&mut conn)?;

        info!(id = stored.id(), winner = %stored.winner(), "Game result recorded");
        Ok(stored)
    }

    /// All stored games, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<GameResult>, DbError> {
        let mut conn = self.connection()?;

        let results = schema::game_results::table
            .order((
                schema::game_results::played_at.desc(),
                schema::game_results::id.desc(),
            ))
            .select(GameResult::as_select())
            .load(&mut conn)?;

        info!(count = results.len(), "History loaded");
        Ok(results)
    }

    /// Deletes every stored game and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_all(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let removed = diesel::delete(schema::game_results::table).execute(&mut conn)?;
        info!(removed, "History cleared");
        Ok(removed)
    }
}
