//! Tests for the canonical game state.

use misere_tictactoe::{Game, MoveError, Outcome, Position, Symbol};

fn pos(row: usize, col: usize) -> Position {
    Position::new(row, col).expect("on board")
}

#[test]
fn test_turn_parity_alternates() {
    let mut game = Game::new();
    assert_eq!(game.next_symbol(), Symbol::X);
    game.play(pos(1, 1)).expect("valid");
    assert_eq!(game.next_symbol(), Symbol::O);
    game.play(pos(0, 0)).expect("valid");
    assert_eq!(game.next_symbol(), Symbol::X);
    assert_eq!(game.turn(), 2);
    assert_eq!(game.board().occupied(), 2);
    assert_eq!(game.history().len(), 2);
    assert_eq!(game.history()[1].symbol, Symbol::O);
}

#[test]
fn test_occupied_cell_rejected_without_change() {
    let mut game = Game::new();
    game.play(pos(1, 1)).expect("valid");
    let before = game.clone();
    let rejected = game.play(pos(1, 1));
    assert_eq!(rejected, Err(MoveError::SquareOccupied(pos(1, 1))));
    assert_eq!(game, before);
}

#[test]
fn test_completing_line_loses() {
    let mut game = Game::new();
    // X: top row; O scattered.
    for (row, col) in [(0, 0), (1, 1), (0, 1), (2, 2)] {
        assert_eq!(game.play(pos(row, col)), Ok(Outcome::InProgress));
    }
    assert_eq!(game.play(pos(0, 2)), Ok(Outcome::Won(Symbol::O)));
    assert_eq!(game.outcome().winner(), Some(Symbol::O));
}

#[test]
fn test_move_after_game_over_rejected() {
    let mut game = Game::new();
    for (row, col) in [(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)] {
        game.play(pos(row, col)).expect("valid");
    }
    assert!(game.outcome().is_over());
    assert_eq!(game.play(pos(2, 0)), Err(MoveError::GameOver));
    assert_eq!(game.turn(), 5);
}

#[test]
fn test_fixed_symbol_placement() {
    let mut game = Game::new();
    game.place(pos(0, 0), Symbol::X).expect("valid");
    game.place(pos(0, 1), Symbol::O).expect("valid");
    assert_eq!(game.turn(), 2);
}

#[test]
fn test_draw_after_nine_moves() {
    let mut game = Game::new();
    // X O X / X O O / O X X
    let order = [
        (0, 0), (0, 1), (0, 2), (1, 1), (1, 0),
        (1, 2), (2, 1), (2, 0), (2, 2),
    ];
    for (i, (row, col)) in order.into_iter().enumerate() {
        let result = game.play(pos(row, col)).expect("valid");
        if i < 8 {
            assert_eq!(result, Outcome::InProgress);
        } else {
            assert_eq!(result, Outcome::Draw);
        }
    }
    assert_eq!(game.board().display(), "X|O|X\n-+-+-\nX|O|O\n-+-+-\nO|X|X");
}

#[test]
fn test_reset_clears_everything() {
    let mut game = Game::new();
    game.play(pos(0, 0)).expect("valid");
    game.reset();
    assert_eq!(game, Game::new());
}

#[test]
fn test_game_serializes() {
    let mut game = Game::new();
    game.play(pos(2, 1)).expect("valid");
    let json = serde_json::to_string(&game).expect("serialize");
    let back: Game = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, game);
}
