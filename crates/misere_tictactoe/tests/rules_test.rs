//! Property tests for the rule engine over every reachable board.

use misere_tictactoe::rules::{is_full, is_terminal, legal_moves, outcome, winning_symbol};
use misere_tictactoe::{Board, Game, Outcome, Position};
use std::collections::HashSet;

/// Every board reachable from the empty board by alternating play.
fn reachable_boards() -> HashSet<Board> {
    fn walk(game: &Game, seen: &mut HashSet<Board>) {
        if !seen.insert(game.board().clone()) || game.outcome().is_over() {
            return;
        }
        for pos in legal_moves(game.board()) {
            let mut next = game.clone();
            next.play(pos).expect("legal move");
            walk(&next, seen);
        }
    }

    let mut seen = HashSet::new();
    walk(&Game::new(), &mut seen);
    seen
}

#[test]
fn test_legal_moves_plus_occupied_is_nine() {
    for board in reachable_boards() {
        assert_eq!(legal_moves(&board).len() + board.occupied(), 9);
    }
}

#[test]
fn test_line_completer_loses() {
    let mut lines_seen = 0;
    for board in reachable_boards() {
        if let Some(completer) = winning_symbol(&board) {
            lines_seen += 1;
            assert_eq!(outcome(&board), Outcome::Won(completer.opponent()));
            assert!(is_terminal(&board));
        }
    }
    assert!(lines_seen > 0);
}

#[test]
fn test_full_board_without_line_is_draw() {
    let mut draws = 0;
    for board in reachable_boards() {
        if is_full(&board) && winning_symbol(&board).is_none() {
            draws += 1;
            assert_eq!(outcome(&board), Outcome::Draw);
        }
    }
    assert!(draws > 0);
}

#[test]
fn test_legal_moves_recomputed_each_call() {
    let mut board = Board::new();
    assert_eq!(legal_moves(&board).len(), 9);
    let corner = Position::new(2, 2).unwrap();
    board = board.with_mark(corner, misere_tictactoe::Symbol::O);
    let moves = legal_moves(&board);
    assert_eq!(moves.len(), 8);
    assert!(!moves.contains(&Position::new(2, 2).unwrap()));
}

#[test]
fn test_board_parse_errors() {
    assert!("XO?......".parse::<Board>().is_err());
    assert!("XO.".parse::<Board>().is_err());
    assert!("XO. ... ..X".parse::<Board>().is_ok());
}
