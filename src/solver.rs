//! An agent to play Connect 4 with a depth-limited minimax search

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{board::*, filter::MoveFilter, SEARCH_DEPTH};

// equally scored moves replace the current best one a fifth of the time
const TIE_BREAK_THRESHOLD: f64 = 0.8;

/// The character of a searched move, for diagnostics only
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MoveType {
    Offensive,
    Defensive,
    Neutral,
    Forced,
}

/// The outcome of a minimax search
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SearchResult {
    /// `None` for leaf positions
    pub column: Option<usize>,
    pub score: i32,
    pub move_type: MoveType,
}

// replies prepared for every filtered opponent move from one position
struct Plan {
    base: Board,
    replies: Vec<Option<usize>>,
}

impl Plan {
    fn reply_for(&self, board: &Board) -> Option<usize> {
        let column = board.last_move()?.column;
        let reply = self.replies.get(column).copied().flatten()?;

        // only valid if the board is the planned position plus the opponent's move
        let mut expected = self.base.clone();
        if expected.play_at_column(column) && expected == *board {
            Some(reply)
        } else {
            None
        }
    }
}

/// An agent to pick Connect 4 moves
///
/// # Notes
/// This agent runs a minimax search [`SEARCH_DEPTH`] plies deep on copies of the board,
/// only exploring the moves kept by its [`MoveFilter`]. Equally scored moves are picked
/// at random so its play is not fully predictable.
///
/// # Position Scoring
/// A leaf scores `depth + 1` if the searching player has won, `-(depth + 1)` if
/// the opponent has won and 0 otherwise, where `depth` is the number of plies
/// left to search. Earlier results therefore weigh more than later ones.
///
/// # Planning
/// [`plan_ahead`](Solver::plan_ahead) searches a reply to every move the opponent is likely
/// to make, so that [`choose_move`](Solver::choose_move) can answer immediately once the
/// opponent has moved.
pub struct Solver<R = StdRng> {
    filter: Box<dyn MoveFilter + Send>,
    rng: R,
    plan: Option<Plan>,
    thinking: bool,

    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
}

impl Solver<StdRng> {
    /// Creates a new `Solver` with an entropy-seeded random source
    pub fn new<F: MoveFilter + Send + 'static>(filter: F) -> Self {
        Self::with_rng(filter, StdRng::from_entropy())
    }

    /// Creates a new `Solver` that breaks ties reproducibly
    pub fn seeded<F: MoveFilter + Send + 'static>(filter: F, seed: u64) -> Self {
        Self::with_rng(filter, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Solver<R> {
    /// Creates a new `Solver` breaking ties with the given random source
    pub fn with_rng<F: MoveFilter + Send + 'static>(filter: F, rng: R) -> Self {
        Self {
            filter: Box::new(filter),
            rng,
            plan: None,
            thinking: false,
            node_count: 0,
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// The reply planned for an opponent move into `column`, if any
    pub fn planned_reply(&self, column: usize) -> Option<usize> {
        self.plan
            .as_ref()
            .and_then(|plan| plan.replies.get(column).copied().flatten())
    }

    /// Picks a column for the player to move
    ///
    /// Uses the planned reply to the opponent's last move when there is one,
    /// otherwise searches. Returns `None` if a search is already running or the
    /// board has no moves. Any plan is discarded.
    pub fn choose_move(&mut self, board: &Board) -> Option<usize> {
        if self.thinking {
            return None;
        }
        self.thinking = true;

        let planned = self.plan.take().and_then(|plan| plan.reply_for(board));
        let result = match (planned, board.current_player()) {
            (Some(column), _) => {
                debug!("playing planned reply {}", column);
                Some(column)
            }
            (None, Some(player)) => {
                let result = self.minimax(board, SEARCH_DEPTH, player, SEARCH_DEPTH);
                debug!(
                    "player {} chose {:?} ({:?}, score {})",
                    player, result.column, result.move_type, result.score
                );
                result.column
            }
            (None, None) => None,
        };

        self.thinking = false;
        result
    }

    /// Prepares replies to the opponent's next move
    ///
    /// `board` should have the opponent to move. Does nothing if a search is
    /// already running.
    pub fn plan_ahead(&mut self, board: &Board) {
        if self.thinking {
            return;
        }
        self.thinking = true;

        let mut replies = vec![None; board.column_count()];
        let candidates = self.filter.filter(&board.available_moves(), board);
        for column in candidates {
            let mut next = board.clone();
            next.play_at_column(column);
            // no reply is needed if the opponent's move ends the game
            if let Some(player) = next.current_player() {
                replies[column] = self.minimax(&next, SEARCH_DEPTH, player, SEARCH_DEPTH).column;
            }
        }
        debug!("planned replies {:?}", replies);

        self.plan = Some(Plan {
            base: board.clone(),
            replies,
        });
        self.thinking = false;
    }

    /// Forgets any plan and clears the thinking guard
    pub fn reset(&mut self) {
        self.plan = None;
        self.thinking = false;
    }

    /// Performs the minimax search for `player`
    ///
    /// `depth` is the number of plies left to search, starting at `max_depth`
    /// for the root. Returns the score of the position (see [Position Scoring])
    /// and the best move found
    ///
    /// [Position Scoring]: #position-scoring
    pub fn minimax(
        &mut self,
        board: &Board,
        max_depth: usize,
        player: Player,
        depth: usize,
    ) -> SearchResult {
        self.node_count += 1;

        let moves = self.filter.filter(&board.available_moves(), board);

        if board.game_over() || depth == 0 || moves.is_empty() {
            let score = match board.winner() {
                Some(winner) if winner == player => depth as i32 + 1,
                Some(_) => -(depth as i32) - 1,
                None => 0,
            };
            return SearchResult {
                column: None,
                score,
                move_type: MoveType::Neutral,
            };
        }

        let maximising = board.current_player() == Some(player);
        let mut best: Option<(usize, i32)> = None;
        let (mut losing, mut winning, mut neutral, mut offensive) = (0, 0, 0, 0);

        for &column in moves.iter() {
            let mut next = board.clone();
            next.play_at_column(column);
            let child = self.minimax(&next, max_depth, player, depth - 1);
            let score = child.score;

            // counted from the point of view of the side to move here
            let (worse, better) = if maximising {
                (score < 0, score > 0)
            } else {
                (score > 0, score < 0)
            };
            losing += worse as usize;
            winning += better as usize;
            neutral += (score == 0) as usize;
            offensive += (child.move_type == MoveType::Defensive) as usize;

            let replace = match best {
                None => true,
                Some((_, best_score)) if best_score == score => {
                    self.rng.gen::<f64>() >= TIE_BREAK_THRESHOLD
                }
                Some((_, best_score)) if maximising => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if replace {
                best = Some((column, score));
            }

            // no need to look for a better win at the root
            if depth == max_depth && next.game_over() && next.winner() == Some(player) {
                break;
            }
        }

        let (column, score) = match best {
            Some(best) => best,
            None => {
                return SearchResult {
                    column: None,
                    score: 0,
                    move_type: MoveType::Neutral,
                }
            }
        };

        let move_type = if offensive > 0 {
            MoveType::Offensive
        } else if score == 0 && losing > 0 {
            MoveType::Defensive
        } else if score == 0 && winning > 0 {
            MoveType::Forced
        } else if ((maximising && score > 0) || (!maximising && score < 0)) && losing + neutral > 0 {
            MoveType::Offensive
        } else {
            MoveType::Neutral
        };

        SearchResult {
            column: Some(column),
            score,
            move_type,
        }
    }
}
