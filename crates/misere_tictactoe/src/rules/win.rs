//! Line detection.

use crate::{Board, Cell, Position, Symbol};
use tracing::instrument;

/// Rows, then columns, then the two diagonals, as row-major indices.
const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the symbol that filled a complete line, scanning rows, columns
/// and diagonals in that order and stopping at the first match.
///
/// Under misère rules this is the *losing* symbol.
#[instrument(skip(board))]
pub fn winning_symbol(board: &Board) -> Option<Symbol> {
    let cells = board.cells();
    for [a, b, c] in LINES {
        if let Cell::Marked(symbol) = cells[a]
            && cells[b] == cells[a]
            && cells[c] == cells[a]
        {
            return Some(symbol);
        }
    }
    None
}

/// Positions of the first completed line, if any.
pub fn completed_line(board: &Board) -> Option<[Position; 3]> {
    let cells = board.cells();
    LINES
        .iter()
        .find(|[a, b, c]| {
            cells[*a] != Cell::Empty && cells[*a] == cells[*b] && cells[*b] == cells[*c]
        })
        .and_then(|line| {
            Some([
                Position::from_index(line[0])?,
                Position::from_index(line[1])?,
                Position::from_index(line[2])?,
            ])
        })
}
