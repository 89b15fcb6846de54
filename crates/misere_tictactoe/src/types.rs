//! Core domain types for misère tic-tac-toe.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// A mark placed on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Symbol {
    /// Symbol X (moves first).
    X,
    /// Symbol O (moves second).
    O,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    /// Symbol that moves on the given turn index when turns alternate.
    pub fn for_turn(turn: u32) -> Self {
        if turn % 2 == 0 { Symbol::X } else { Symbol::O }
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Cell holds a mark.
    Marked(Symbol),
}

impl Cell {
    fn glyph(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Marked(Symbol::X) => 'X',
            Cell::Marked(Symbol::O) => 'O',
        }
    }
}

/// A cell coordinate, row and column both in `0..3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    /// Creates a position, or `None` when either coordinate is off the board.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < 3 && col < 3).then_some(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    /// Creates a position from a row-major index (0-8).
    pub fn from_index(index: usize) -> Option<Self> {
        (index < 9).then(|| Self {
            row: (index / 3) as u8,
            col: (index % 3) as u8,
        })
    }

    /// Row (0-2).
    pub fn row(self) -> usize {
        self.row as usize
    }

    /// Column (0-2).
    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Row-major index (0-8).
    pub fn index(self) -> usize {
        self.row() * 3 + self.col()
    }

    /// All nine positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..9).filter_map(Position::from_index)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 3x3 board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    /// Cells in row-major order.
    cells: [Cell; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at `pos`.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.index()]
    }

    /// Overwrites the cell at `pos`. No rule checks; see [`crate::Game`].
    pub fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.index()] = cell;
    }

    /// Returns a copy of this board with `symbol` placed at `pos`.
    pub fn with_mark(&self, pos: Position, symbol: Symbol) -> Self {
        let mut next = self.clone();
        next.set(pos, Cell::Marked(symbol));
        next
    }

    /// True if nobody has played at `pos`.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Cell::Empty
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Number of marked cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| **c != Cell::Empty).count()
    }

    /// Formats the board as three rows separated by newlines.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                result.push(self.cells[row * 3 + col].glyph());
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// Error parsing a board from text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum BoardParseError {
    /// A character other than `X`, `O`, `.` or a separator.
    #[display("Unexpected board character {:?}", _0)]
    UnexpectedChar(char),
    /// Not exactly nine cells.
    #[display("Expected 9 cells, found {}", _0)]
    WrongCellCount(usize),
}

impl std::error::Error for BoardParseError {}

impl FromStr for Board {
    type Err = BoardParseError;

    /// Parses nine cells from `X`, `O` and `.`, ignoring whitespace, `|` and `-`.
    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = Vec::with_capacity(9);
        for ch in s.chars() {
            let cell = match ch {
                'X' | 'x' => Cell::Marked(Symbol::X),
                'O' | 'o' => Cell::Marked(Symbol::O),
                '.' | '_' => Cell::Empty,
                '|' | '-' | '+' => continue,
                c if c.is_whitespace() => continue,
                c => return Err(BoardParseError::UnexpectedChar(c)),
            };
            cells.push(cell);
        }
        let cells: [Cell; 9] = cells
            .try_into()
            .map_err(|v: Vec<Cell>| BoardParseError::WrongCellCount(v.len()))?;
        Ok(Self { cells })
    }
}

/// Result of a game from the board's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// Game is ongoing.
    #[default]
    InProgress,
    /// Game ended; the symbol is the winner, i.e. the player who did NOT complete the line.
    Won(Symbol),
    /// Board filled without anyone completing a line.
    Draw,
}

impl Outcome {
    /// True once the game has ended.
    pub fn is_over(self) -> bool {
        self != Outcome::InProgress
    }

    /// Winning symbol, if any.
    pub fn winner(self) -> Option<Symbol> {
        match self {
            Outcome::Won(symbol) => Some(symbol),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "In progress"),
            Outcome::Won(symbol) => write!(f, "{} wins", symbol),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}
