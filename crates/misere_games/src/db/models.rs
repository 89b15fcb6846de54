//! Database models for match history.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use misere_tictactoe::{Difficulty, Outcome, Symbol};
use tracing::instrument;

use crate::ModeKind;
use crate::db::{DbError, schema};

/// Stored value of `winner` for a drawn game.
pub const DRAW: &str = "Draw";

/// A finished game as stored.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct GameResult {
    id: i32,
    played_at: NaiveDateTime,
    winner: String,
    difficulty: Option<String>,
    mode: String,
}

impl GameResult {
    /// Parses the stored winner; `None` means the game was drawn.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the column holds anything but `X`, `O` or `Draw`.
    #[instrument(skip(self), fields(winner = %self.winner))]
    pub fn winner_symbol(&self) -> Result<Option<Symbol>, DbError> {
        if self.winner == DRAW {
            return Ok(None);
        }
        self.winner
            .parse::<Symbol>()
            .map(Some)
            .map_err(|_| DbError::database(format!("Invalid winner: '{}'", self.winner)))
    }

    /// Parses the stored mode.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on an unknown mode string.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn mode_kind(&self) -> Result<ModeKind, DbError> {
        self.mode
            .parse::<ModeKind>()
            .map_err(|_| DbError::database(format!("Invalid mode: '{}'", self.mode)))
    }
}

/// Insertable history record.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct NewGameResult {
    played_at: NaiveDateTime,
    winner: String,
    difficulty: Option<String>,
    mode: String,
}

impl NewGameResult {
    /// Builds a record for a finished game, stamped with the current UTC time.
    ///
    /// Returns `None` while the game is still in progress.
    #[instrument]
    pub fn finished(
        outcome: Outcome,
        difficulty: Option<Difficulty>,
        mode: ModeKind,
    ) -> Option<Self> {
        let winner = match outcome {
            Outcome::InProgress => return None,
            Outcome::Won(symbol) => symbol.to_string(),
            Outcome::Draw => DRAW.to_string(),
        };
        Some(Self::new(
            chrono::Utc::now().naive_utc(),
            winner,
            difficulty.map(|d| d.to_string()),
            mode.to_string(),
        ))
    }
}
