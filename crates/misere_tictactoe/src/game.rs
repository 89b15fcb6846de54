//! Canonical game state: board, turn counter and outcome.

use crate::rules;
use crate::{Board, Cell, Outcome, Position, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A single placement: who played where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Symbol placed.
    pub symbol: Symbol,
    /// Cell it was placed on.
    pub position: Position,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.symbol, self.position)
    }
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    SquareOccupied(Position),

    /// The game has already ended.
    #[display("Game is already over")]
    GameOver,
}

impl std::error::Error for MoveError {}

/// Misère tic-tac-toe game.
///
/// Invariant: `turn == board.occupied() == history.len()`, and `outcome` is
/// always [`rules::outcome`] of the current board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    turn: u32,
    outcome: Outcome,
    history: Vec<Move>,
}

impl Game {
    /// Creates a new game on an empty board.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Number of moves played so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Current outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Moves played, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Symbol implied by turn parity (X on even turns).
    pub fn next_symbol(&self) -> Symbol {
        Symbol::for_turn(self.turn)
    }

    /// Places `symbol` at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::GameOver`] once the game has ended and
    /// [`MoveError::SquareOccupied`] if the cell is taken. The game is left
    /// untouched on error.
    #[instrument(skip(self), fields(turn = self.turn))]
    pub fn place(&mut self, position: Position, symbol: Symbol) -> Result<Outcome, MoveError> {
        if self.outcome.is_over() {
            return Err(MoveError::GameOver);
        }
        if !self.board.is_empty(position) {
            return Err(MoveError::SquareOccupied(position));
        }

        self.board.set(position, Cell::Marked(symbol));
        self.history.push(Move { symbol, position });
        self.turn += 1;
        self.outcome = rules::outcome(&self.board);

        debug!(%symbol, %position, outcome = %self.outcome, "Move applied");
        Ok(self.outcome)
    }

    /// Places the symbol implied by turn parity at `position`.
    ///
    /// # Errors
    ///
    /// See [`Game::place`].
    #[instrument(skip(self), fields(turn = self.turn))]
    pub fn play(&mut self, position: Position) -> Result<Outcome, MoveError> {
        let symbol = self.next_symbol();
        self.place(position, symbol)
    }

    /// Clears the board and starts over.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
