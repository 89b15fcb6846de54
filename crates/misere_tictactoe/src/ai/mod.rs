//! Computer opponent: difficulty policy on top of alpha-beta search.

mod search;

pub use search::{LOSS_SCORE, WIN_SCORE, optimal_move, scored_moves};

use crate::rules::legal_moves;
use crate::{Board, Position, Symbol};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// How hard the computer tries.
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
#[strum(ascii_case_insensitive)]
pub enum Difficulty {
    /// Uniformly random legal moves.
    #[default]
    Easy,
    /// Fair coin per decision between optimal and random.
    Medium,
    /// Always optimal.
    Hard,
}

/// Picks a move for `ai` using the process-wide random source.
///
/// Returns `None` only when the board has no empty cell.
#[instrument(skip(board), fields(board = %board.display()))]
pub fn select_move(board: &Board, difficulty: Difficulty, ai: Symbol) -> Option<Position> {
    select_move_with(board, difficulty, ai, &mut rand::rng())
}

/// Same as [`select_move`] with an explicit random source.
#[instrument(skip(board, rng))]
pub fn select_move_with<R: Rng + ?Sized>(
    board: &Board,
    difficulty: Difficulty,
    ai: Symbol,
    rng: &mut R,
) -> Option<Position> {
    let moves = legal_moves(board);
    if moves.is_empty() {
        debug!("No legal moves");
        return None;
    }

    let choice = match difficulty {
        Difficulty::Easy => moves.choose(rng).copied(),
        Difficulty::Medium => {
            if rng.random_bool(0.5) {
                optimal_move(board, ai)
            } else {
                moves.choose(rng).copied()
            }
        }
        Difficulty::Hard => optimal_move(board, ai),
    };

    debug!(?choice, "AI selected move");
    choice
}
