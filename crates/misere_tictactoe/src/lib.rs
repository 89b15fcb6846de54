//! Misère tic-tac-toe: rules and computer opponent.
//!
//! In misère tic-tac-toe the player who completes a line of three *loses*.
//!
//! # Architecture
//!
//! - **Types**: [`Board`], [`Cell`], [`Symbol`], [`Position`], [`Outcome`]
//! - **Rules**: pure functions in [`rules`] (line detection, full board,
//!   legal moves, misère outcome)
//! - **Game**: [`Game`] owns board, turn counter and outcome
//! - **AI**: [`select_move`] applies a [`Difficulty`] policy over
//!   full-depth alpha-beta search
//!
//! # Example
//!
//! ```
//! use misere_tictactoe::{Difficulty, Game, Symbol, select_move};
//!
//! let mut game = Game::new();
//! let first = select_move(game.board(), Difficulty::Hard, Symbol::X).unwrap();
//! game.place(first, Symbol::X).unwrap();
//! assert_eq!(game.turn(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod ai;
mod game;
pub mod rules;
mod types;

pub use ai::{
    Difficulty, LOSS_SCORE, WIN_SCORE, optimal_move, scored_moves, select_move, select_move_with,
};
pub use game::{Game, Move, MoveError};
pub use types::{Board, BoardParseError, Cell, Outcome, Position, Symbol};
