//! Parsing of typed console commands.

use crate::protocol::decode_move;
use misere_tictactoe::Position;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Play a cell.
    Play(Position),
    /// Start over.
    NewGame,
    /// Show help.
    Help,
    /// Leave.
    Quit,
    /// Nothing to do (blank line).
    Empty,
    /// Could not make sense of the line.
    Unknown,
}

/// Parses `row,col`, `row col`, `new`, `help` or `quit`.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => Input::Empty,
        "new" | "n" | "restart" => Input::NewGame,
        "help" | "h" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        _ => {
            let cell = if line.contains(',') {
                line.to_string()
            } else {
                line.split_whitespace().collect::<Vec<_>>().join(",")
            };
            decode_move(&cell).map_or(Input::Unknown, Input::Play)
        }
    }
}
