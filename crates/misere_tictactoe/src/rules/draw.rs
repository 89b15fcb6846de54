//! Full-board detection.

use crate::{Board, Cell};
use tracing::instrument;

/// Checks if the board is full (no empty cells).
///
/// A full board with no completed line is a draw.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|c| *c != Cell::Empty)
}

#[cfg(test)]
mod tests {
    use super::super::outcome;
    use super::*;
    use crate::{Outcome, Position, Symbol};

    #[test]
    fn test_empty_board_not_full() {
        let board = Board::new();
        assert!(!is_full(&board));
    }

    #[test]
    fn test_partial_board_not_full() {
        let mut board = Board::new();
        let center = Position::new(1, 1).unwrap();
        board.set(center, Cell::Marked(Symbol::X));
        assert!(!is_full(&board));
    }

    #[test]
    fn test_full_board() {
        let mut board = Board::new();
        for pos in Position::all() {
            board.set(pos, Cell::Marked(Symbol::X));
        }
        assert!(is_full(&board));
    }

    #[test]
    fn test_draw_detection() {
        // X O X / X O O / O X X has no line.
        let board: Board = "XOX XOO OXX".parse().unwrap();
        assert!(is_full(&board));
        assert_eq!(outcome(&board), Outcome::Draw);
    }

    #[test]
    fn test_full_board_with_line_is_not_draw() {
        // X completes the top row on the last move; O wins.
        let board: Board = "XXX OOX XOO".parse().unwrap();
        assert!(is_full(&board));
        assert_eq!(outcome(&board), Outcome::Won(Symbol::O));
    }
}
