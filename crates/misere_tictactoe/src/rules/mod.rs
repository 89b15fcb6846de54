//! Game rules for misère tic-tac-toe.
//!
//! Pure functions over a [`Board`]. The engine reports who *completed* a
//! line; [`outcome`] applies the misère inversion and names the other
//! symbol as the winner.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::winning_symbol;

use crate::{Board, Outcome, Position};
use tracing::instrument;

/// All empty cells in row-major order. Recomputed on every call.
#[instrument(skip(board))]
pub fn legal_moves(board: &Board) -> Vec<Position> {
    Position::all().filter(|pos| board.is_empty(*pos)).collect()
}

/// True once a line has been completed or the board is full.
#[instrument(skip(board))]
pub fn is_terminal(board: &Board) -> bool {
    winning_symbol(board).is_some() || is_full(board)
}

/// Misère outcome of a board: completing a line loses.
#[instrument(skip(board))]
pub fn outcome(board: &Board) -> Outcome {
    match winning_symbol(board) {
        Some(completer) => Outcome::Won(completer.opponent()),
        None if is_full(board) => Outcome::Draw,
        None => Outcome::InProgress,
    }
}
