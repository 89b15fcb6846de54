//! Full-depth minimax with alpha-beta pruning under misère scoring.

use crate::rules::{is_full, legal_moves, winning_symbol};
use crate::{Board, Position, Symbol};
use tracing::{debug, instrument};

/// Score of a position the maximizer has won at depth 0.
pub const WIN_SCORE: i32 = 1000;

/// Score of a position the maximizer has lost at depth 0.
pub const LOSS_SCORE: i32 = -1000;

/// Best move for `ai`, or `None` on a board with no empty cell.
///
/// Ties go to the first move in row-major order.
#[instrument(skip(board))]
pub fn optimal_move(board: &Board, ai: Symbol) -> Option<Position> {
    let mut best: Option<(Position, i32)> = None;
    for (position, score) in scored_moves(board, ai) {
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((position, score));
        }
    }
    debug!(?best, "Search finished");
    best.map(|(position, _)| position)
}

/// Exact minimax score of every legal move for `ai`, in row-major order.
///
/// Positive scores are forced wins, negative forced losses, zero a draw.
/// Terminal scores are `WIN_SCORE - depth` and `LOSS_SCORE + depth`, so a
/// quicker win or a slower loss ranks higher.
#[instrument(skip(board))]
pub fn scored_moves(board: &Board, ai: Symbol) -> Vec<(Position, i32)> {
    legal_moves(board)
        .into_iter()
        .map(|position| {
            let next = board.with_mark(position, ai);
            let score = minimax(&next, 0, false, ai, i32::MIN, i32::MAX);
            (position, score)
        })
        .collect()
}

fn minimax(
    board: &Board,
    depth: i32,
    maximizing: bool,
    ai: Symbol,
    mut alpha: i32,
    mut beta: i32,
) -> i32 {
    if let Some(completer) = winning_symbol(board) {
        // Completing a line loses.
        return if completer == ai {
            LOSS_SCORE + depth
        } else {
            WIN_SCORE - depth
        };
    }
    if is_full(board) {
        return 0;
    }

    let moves = legal_moves(board);
    if maximizing {
        let mut best = i32::MIN;
        for position in moves {
            let next = board.with_mark(position, ai);
            let score = minimax(&next, depth + 1, false, ai, alpha, beta);
            best = best.max(score);
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        best
    } else {
        let mut best = i32::MAX;
        for position in moves {
            let next = board.with_mark(position, ai.opponent());
            let score = minimax(&next, depth + 1, true, ai, alpha, beta);
            best = best.min(score);
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        best
    }
}
