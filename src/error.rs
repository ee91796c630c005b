//! Errors raised when rebuilding a board from a snapshot

/// Reasons a snapshot is refused by [`Board::from_snapshot`](crate::board::Board::from_snapshot)
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("board dimensions must be positive, got {columns}x{cells}")]
    EmptyDimensions { columns: usize, cells: usize },

    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("column {column} has {found} cells, expected {expected}")]
    CellCount {
        column: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell content {value} at column {column}, cell {cell}")]
    UnknownCell { column: usize, cell: usize, value: i8 },

    #[error("column index {index} of column {column} does not match its contents")]
    ColumnIndex { column: usize, index: i32 },

    #[error("unknown player id {0}")]
    UnknownPlayer(u8),

    #[error("move count {found} does not match {expected} occupied cells")]
    MoveCount { expected: usize, found: usize },

    #[error("last move ({column}, {cell}) is not an occupied cell")]
    LastMove { column: i32, cell: i32 },

    #[error("inconsistent turn state: game over {game_over}, current player {current_player}, winner {winner}")]
    TurnState {
        game_over: bool,
        current_player: u8,
        winner: u8,
    },
}
