//! Heuristics that narrow the moves explored by the [`Solver`](crate::solver::Solver)

use crate::board::Board;

/// A strategy for choosing which legal moves are worth searching
pub trait MoveFilter {
    /// Returns a subsequence of `moves`, never empty unless `moves` is
    fn filter(&self, moves: &[usize], board: &Board) -> Vec<usize>;
}

/// Keeps the moves on top of or next to existing tiles
///
/// Far-flung empty columns are rarely good moves. If no candidate touches a
/// tile, the middle candidate is kept on its own.
#[derive(Copy, Clone, Debug, Default)]
pub struct Concentration;

impl MoveFilter for Concentration {
    fn filter(&self, moves: &[usize], board: &Board) -> Vec<usize> {
        let occupied = |column: usize| board.pieces_in_column(column) > 0;

        let result: Vec<usize> = moves
            .iter()
            .copied()
            .filter(|&column| {
                occupied(column)
                    || (column > 0 && occupied(column - 1))
                    || (column + 1 < board.column_count() && occupied(column + 1))
            })
            .collect();

        match (result.is_empty(), moves.get(moves.len() / 2)) {
            (true, Some(&middle)) => vec![middle],
            _ => result,
        }
    }
}

/// Searches every legal move
#[derive(Copy, Clone, Debug, Default)]
pub struct Unfiltered;

impl MoveFilter for Unfiltered {
    fn filter(&self, moves: &[usize], _board: &Board) -> Vec<usize> {
        moves.to_vec()
    }
}
