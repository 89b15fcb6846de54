//! Text rendering of a game snapshot.

use crate::session::GameSnapshot;
use crate::settings::ModeKind;
use misere_tictactoe::{Outcome, Position, rules};

/// Draws the board and a status line below it.
pub fn render(snapshot: &GameSnapshot) -> String {
    let mut out = String::from("  0 1 2\n");
    for (row, line) in snapshot.board().display().lines().enumerate() {
        if row % 2 == 0 {
            out.push_str(&format!("{} {}\n", row / 2, line));
        } else {
            out.push_str(&format!("  {}\n", line));
        }
    }
    out.push_str(&status_line(snapshot));
    out
}

/// One-line summary of whose turn it is or how the game ended.
pub fn status_line(snapshot: &GameSnapshot) -> String {
    match snapshot.outcome() {
        Outcome::InProgress if *snapshot.thinking() => "Computer is thinking...".to_string(),
        Outcome::InProgress => {
            let mover = misere_tictactoe::Symbol::for_turn(*snapshot.turn());
            match snapshot.mode() {
                ModeKind::VsAi => format!("Your move ({})", mover),
                ModeKind::LocalTwoPlayer | ModeKind::RemoteTwoPlayer => {
                    format!("{} to move", mover)
                }
            }
        }
        Outcome::Won(winner) => {
            let line = rules::win::completed_line(snapshot.board())
                .map(|cells| describe_line(&cells))
                .unwrap_or_default();
            format!("{} wins; {} completed {}", winner, winner.opponent(), line)
        }
        Outcome::Draw => "Draw".to_string(),
    }
}

fn describe_line(cells: &[Position; 3]) -> String {
    cells
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use misere_tictactoe::Board;

    #[test]
    fn test_describe_completed_diagonal() {
        let board: Board = "X.O .XO O.X".parse().unwrap();
        let line = rules::win::completed_line(&board).unwrap();
        assert_eq!(describe_line(&line), "(0, 0) (1, 1) (2, 2)");
    }
}
