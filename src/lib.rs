//! A minimax opponent for the vertical-drop board game 'Connect 4'
//!
//! The board supports any number of columns and cells per column. The agent
//! runs a fixed-depth minimax search over copies of the board, narrowed by a
//! pluggable move filter, and can plan its replies while the opponent thinks.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_minimax::{board::Board, filter::Concentration, solver::Solver};
//!
//! let mut board = Board::new(7, 6);
//! for &column in [0, 0, 1, 1, 2, 2].iter() {
//!     board.play_at_column(column);
//! }
//!
//! let mut solver = Solver::seeded(Concentration, 7);
//! assert_eq!(solver.choose_move(&board), Some(3));
//! ```

use static_assertions::*;
use std::time::Duration;
pub use anyhow;

pub mod error;

pub mod board;

pub mod filter;

pub mod solver;

pub mod worker;


/// The number of aligned tiles needed to win
pub const WINNING_LENGTH: usize = 4;

/// The number of plies searched by the minimax agent
pub const SEARCH_DEPTH: usize = 4;

/// The default width of the game board in tiles
pub const DEFAULT_COLUMNS: usize = 15;

/// The default height of the game board in tiles
pub const DEFAULT_CELLS_PER_COLUMN: usize = 6;

/// The minimum time between an AI move being requested and it being played
pub const MIN_MOVE_DELAY: Duration = Duration::from_millis(500);

// a default board must be able to hold a winning run in every direction
const_assert!(DEFAULT_CELLS_PER_COLUMN >= WINNING_LENGTH);
const_assert!(DEFAULT_COLUMNS >= WINNING_LENGTH);
const_assert!(SEARCH_DEPTH > 0);
