use serde::{Deserialize, Serialize};

use std::fmt;

use crate::error::SnapshotError;
use crate::WINNING_LENGTH;

/// Raw cell value of an empty cell in a snapshot
pub const RAW_EMPTY: i8 = 0;
/// Raw cell value of a cell belonging to a detected winning run
pub const RAW_WINNING: i8 = -1;

// line directions as (column step, cell step)
const DIRECTIONS: [(isize, isize); 4] = [
    // row
    (1, 0),
    // column
    (0, 1),
    // diagonals
    (1, 1),
    (1, -1),
];

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The numeric id used on the wire, `1` or `2`
    pub fn id(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> Self {
        player.id()
    }
}

impl TryFrom<u8> for Player {
    type Error = SnapshotError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Player::from_id(id).ok_or(SnapshotError::UnknownPlayer(id))
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Cell {
    Empty,
    Taken(Player),
    /// Part of a winning run. The occupant is only recoverable from the board's winner
    Winning,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn to_raw(self) -> i8 {
        match self {
            Cell::Empty => RAW_EMPTY,
            Cell::Taken(player) => player.id() as i8,
            Cell::Winning => RAW_WINNING,
        }
    }

    pub fn from_raw(value: i8) -> Option<Self> {
        match value {
            RAW_EMPTY => Some(Cell::Empty),
            RAW_WINNING => Some(Cell::Winning),
            1 => Some(Cell::Taken(Player::One)),
            2 => Some(Cell::Taken(Player::Two)),
            _ => None,
        }
    }

    // winning cells provably held the winner's tile, so they extend any run
    fn extends_run_of(&self, player: Player) -> bool {
        match self {
            Cell::Taken(owner) => *owner == player,
            Cell::Winning => true,
            Cell::Empty => false,
        }
    }
}

/// A position on the board. Cell `0` is the top of a column
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Coordinate {
    pub column: usize,
    pub cell: usize,
}

/// Wire form of a coordinate, `{-1, -1}` when no move has been made
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct RawCoordinate {
    pub column: i32,
    pub cell: i32,
}

impl RawCoordinate {
    pub const NONE: RawCoordinate = RawCoordinate { column: -1, cell: -1 };
}

/// Serializable image of every field of a [`Board`]
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub column_count: usize,
    pub cells_per_column: usize,
    pub current_player: u8,
    pub game_over: bool,
    pub winner: u8,
    pub move_count: usize,
    pub last_move: RawCoordinate,
    pub columns: Vec<Vec<i8>>,
    pub column_index: Vec<i32>,
}

/// The game state of a Connect 4 board of arbitrary size
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Board {
    column_count: usize,
    cells_per_column: usize,
    // cells are stored column by column, top-to-bottom
    columns: Vec<Vec<Cell>>,
    // empty cells left in each column, the next tile lands at `free - 1`
    free: Vec<usize>,
    current_player: Option<Player>,
    move_count: usize,
    last_move: Option<Coordinate>,
    game_over: bool,
    winner: Option<Player>,
}

impl Board {
    /// Creates an empty board with player one to move
    ///
    /// # Panics
    /// Panics if either dimension is zero
    pub fn new(column_count: usize, cells_per_column: usize) -> Self {
        assert!(
            column_count > 0 && cells_per_column > 0,
            "board dimensions must be positive"
        );
        let mut board = Self {
            column_count,
            cells_per_column,
            columns: Vec::new(),
            free: Vec::new(),
            current_player: None,
            move_count: 0,
            last_move: None,
            game_over: false,
            winner: None,
        };
        board.reset();
        board
    }

    /// Clears the board, keeping its dimensions
    pub fn reset(&mut self) {
        self.columns = vec![vec![Cell::Empty; self.cells_per_column]; self.column_count];
        self.free = vec![self.cells_per_column; self.column_count];
        self.current_player = Some(Player::One);
        self.move_count = 0;
        self.last_move = None;
        self.game_over = false;
        self.winner = None;
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn cells_per_column(&self) -> usize {
        self.cells_per_column
    }

    /// The player to move, `None` once the game is over
    pub fn current_player(&self) -> Option<Player> {
        self.current_player
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn last_move(&self) -> Option<Coordinate> {
        self.last_move
    }

    pub fn cell(&self, column: usize, cell: usize) -> Option<Cell> {
        self.columns.get(column).and_then(|c| c.get(cell)).copied()
    }

    pub fn column(&self, column: usize) -> Option<&[Cell]> {
        self.columns.get(column).map(|c| c.as_slice())
    }

    /// The number of tiles stacked in a column
    pub fn pieces_in_column(&self, column: usize) -> usize {
        self.free
            .get(column)
            .map_or(0, |free| self.cells_per_column - free)
    }

    // the snapshot form of the next free cell of a column, negative when full
    fn column_index(&self, column: usize) -> i32 {
        self.free[column] as i32 - 1
    }

    pub fn playable(&self, column: usize) -> bool {
        !self.game_over && self.free.get(column).map_or(false, |&free| free > 0)
    }

    /// Columns that accept a tile, in ascending order. Empty once the game is over
    pub fn available_moves(&self) -> Vec<usize> {
        if self.game_over {
            return Vec::new();
        }
        (0..self.column_count)
            .filter(|&column| self.free[column] > 0)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.free.iter().all(|&free| free == 0)
    }

    /// True when the board is full without a winner
    pub fn is_draw(&self) -> bool {
        self.winner.is_none() && self.is_full()
    }

    /// Ends a drawn game. Win detection never does this, so whoever drives the
    /// game calls it once no moves are left
    pub fn settle_draw(&mut self) -> bool {
        if self.game_over || !self.is_draw() {
            return false;
        }
        self.game_over = true;
        self.current_player = None;
        true
    }

    /// Drops a tile for the current player into `column`
    ///
    /// Returns `false` without touching the board if the column is out of range
    /// or full, or if the game is over
    pub fn play_at_column(&mut self, column: usize) -> bool {
        let player = match self.current_player {
            Some(player) if self.playable(column) => player,
            _ => return false,
        };

        let cell = self.free[column] - 1;
        self.columns[column][cell] = Cell::Taken(player);
        self.free[column] -= 1;
        self.move_count += 1;
        self.last_move = Some(Coordinate { column, cell });
        self.current_player = Some(player.other());

        self.check_winners(player);
        true
    }

    fn check_winners(&mut self, player: Player) {
        // nobody can have a full run before this many tiles are down
        if self.move_count < 2 * WINNING_LENGTH - 1 {
            return;
        }
        let anchor = match self.last_move {
            Some(anchor) => anchor,
            None => return,
        };

        // every direction is checked so that all winning runs get tagged
        let mut has_winner = false;
        for &direction in DIRECTIONS.iter() {
            has_winner = self.check_line(anchor, player, direction) || has_winner;
        }

        if has_winner {
            self.winner = Some(player);
            self.game_over = true;
            self.current_player = None;
        }
    }

    fn offset(&self, anchor: Coordinate, (dc, dr): (isize, isize), step: isize) -> Option<Coordinate> {
        let column = anchor.column as isize + dc * step;
        let cell = anchor.cell as isize + dr * step;
        if column < 0
            || cell < 0
            || column >= self.column_count as isize
            || cell >= self.cells_per_column as isize
        {
            return None;
        }
        Some(Coordinate {
            column: column as usize,
            cell: cell as usize,
        })
    }

    // collects the run through `anchor` and tags it if it is long enough
    fn check_line(&mut self, anchor: Coordinate, player: Player, direction: (isize, isize)) -> bool {
        let reach = WINNING_LENGTH as isize - 1;
        let mut run = Vec::with_capacity(2 * WINNING_LENGTH - 1);

        for step in -reach..=reach {
            let matched = self
                .offset(anchor, direction, step)
                .filter(|c| self.columns[c.column][c.cell].extends_run_of(player));
            match matched {
                Some(coordinate) => run.push(coordinate),
                // a gap before the anchor restarts the run, a gap after it ends the run
                None if step < 0 => run.clear(),
                None => break,
            }
        }

        if run.len() < WINNING_LENGTH {
            return false;
        }
        for coordinate in run {
            self.columns[coordinate.column][coordinate.cell] = Cell::Winning;
        }
        true
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            column_count: self.column_count,
            cells_per_column: self.cells_per_column,
            current_player: self.current_player.map_or(0, Player::id),
            game_over: self.game_over,
            winner: self.winner.map_or(0, Player::id),
            move_count: self.move_count,
            last_move: self.last_move.map_or(RawCoordinate::NONE, |c| RawCoordinate {
                column: c.column as i32,
                cell: c.cell as i32,
            }),
            columns: self
                .columns
                .iter()
                .map(|column| column.iter().map(|cell| cell.to_raw()).collect())
                .collect(),
            column_index: (0..self.column_count).map(|c| self.column_index(c)).collect(),
        }
    }

    /// Rebuilds a board from a snapshot, refusing anything inconsistent
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let Snapshot {
            column_count,
            cells_per_column,
            current_player,
            game_over,
            winner,
            move_count,
            last_move,
            columns: raw_columns,
            column_index,
        } = snapshot;

        if column_count == 0 || cells_per_column == 0 {
            return Err(SnapshotError::EmptyDimensions {
                columns: column_count,
                cells: cells_per_column,
            });
        }
        for found in [raw_columns.len(), column_index.len()].iter().copied() {
            if found != column_count {
                return Err(SnapshotError::ColumnCount {
                    expected: column_count,
                    found,
                });
            }
        }

        let mut columns = Vec::with_capacity(column_count);
        let mut free = Vec::with_capacity(column_count);
        let mut occupied = 0;
        for (column, (raw_column, &index)) in raw_columns.iter().zip(column_index.iter()).enumerate() {
            if raw_column.len() != cells_per_column {
                return Err(SnapshotError::CellCount {
                    column,
                    expected: cells_per_column,
                    found: raw_column.len(),
                });
            }
            let cells = raw_column
                .iter()
                .enumerate()
                .map(|(cell, &value)| {
                    Cell::from_raw(value).ok_or(SnapshotError::UnknownCell { column, cell, value })
                })
                .collect::<Result<Vec<_>, _>>()?;

            // tiles stack from the bottom, so empty cells must all sit above the index
            if index < -1 || index >= cells_per_column as i32 {
                return Err(SnapshotError::ColumnIndex { column, index });
            }
            let column_free = (index + 1) as usize;
            let stacked = cells
                .iter()
                .enumerate()
                .all(|(cell, content)| content.is_empty() == (cell < column_free));
            if !stacked {
                return Err(SnapshotError::ColumnIndex { column, index });
            }

            occupied += cells_per_column - column_free;
            columns.push(cells);
            free.push(column_free);
        }

        if move_count != occupied {
            return Err(SnapshotError::MoveCount {
                expected: occupied,
                found: move_count,
            });
        }

        let turn_error = SnapshotError::TurnState {
            game_over,
            current_player,
            winner,
        };
        let current = match current_player {
            0 => None,
            id => Some(Player::try_from(id)?),
        };
        let winning_player = match winner {
            0 => None,
            id => Some(Player::try_from(id)?),
        };
        if game_over == current.is_some() || (!game_over && winning_player.is_some()) {
            return Err(turn_error);
        }

        let last = if last_move == RawCoordinate::NONE {
            None
        } else {
            let in_range = last_move.column >= 0
                && last_move.cell >= 0
                && (last_move.column as usize) < column_count
                && (last_move.cell as usize) < cells_per_column;
            if !in_range || columns[last_move.column as usize][last_move.cell as usize].is_empty() {
                return Err(SnapshotError::LastMove {
                    column: last_move.column,
                    cell: last_move.cell,
                });
            }
            Some(Coordinate {
                column: last_move.column as usize,
                cell: last_move.cell as usize,
            })
        };
        if last.is_none() != (move_count == 0) {
            return Err(SnapshotError::LastMove {
                column: last_move.column,
                cell: last_move.cell,
            });
        }

        Ok(Self {
            column_count,
            cells_per_column,
            columns,
            free,
            current_player: current,
            move_count,
            last_move: last,
            game_over,
            winner: winning_player,
        })
    }

    /// JSON text of the board snapshot
    pub fn serialize(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    pub fn deserialize(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in 0..self.cells_per_column {
            if cell > 0 {
                writeln!(f)?;
            }
            for column in 0..self.column_count {
                if column > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:>2}", self.columns[column][cell].to_raw())?;
            }
        }
        Ok(())
    }
}
