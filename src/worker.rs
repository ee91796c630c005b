//! Runs a [`Solver`] on its own thread, exchanging board snapshots over channels
//!
//! The interactive side holds the authoritative [`Board`] and an [`AiPlayer`] per
//! automated player. Each `AiPlayer` owns a worker thread with its own `Solver`;
//! the two sides share no memory and only pass [`Envelope`]s.

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::{board::*, filter::MoveFilter, solver::Solver};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    RequestMove(Snapshot),
    RequestPlan(Snapshot),
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    MoveReady(Option<usize>),
    PlanReady,
}

/// What [`AiPlayer::poll`] found
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnStatus {
    /// No playable answer yet
    Waiting,
    /// The column to play
    Move(usize),
    /// The worker gave up on the position or is gone
    NoMove,
}

/// A message tagged with enough identity to validate its reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub sequence: u64,
    /// The player the worker plays for
    pub player: Player,
    /// The board's move count when the request was made
    pub move_count: usize,
    pub body: T,
}

// worker side: one solver for the lifetime of the thread
fn run_worker(
    player: Player,
    mut solver: Solver,
    requests: Receiver<Envelope<Request>>,
    responses: Sender<Envelope<Response>>,
) {
    for request in requests.iter() {
        let Envelope {
            sequence,
            move_count,
            body,
            ..
        } = request;

        let reply = match body {
            Request::RequestMove(snapshot) => {
                let column = match Board::from_snapshot(snapshot) {
                    Ok(board) => solver.choose_move(&board),
                    Err(err) => {
                        warn!("player {} worker got a bad snapshot: {}", player, err);
                        None
                    }
                };
                Response::MoveReady(column)
            }
            Request::RequestPlan(snapshot) => {
                match Board::from_snapshot(snapshot) {
                    Ok(board) => solver.plan_ahead(&board),
                    Err(err) => warn!("player {} worker got a bad snapshot: {}", player, err),
                }
                Response::PlanReady
            }
            Request::Reset => {
                solver.reset();
                continue;
            }
        };

        let envelope = Envelope {
            sequence,
            player,
            move_count,
            body: reply,
        };
        // the interactive side is gone
        if responses.send(envelope).is_err() {
            break;
        }
    }
    debug!("player {} worker stopped", player);
}

// the move request whose answer is still awaited or not yet played
struct Pending {
    sequence: u64,
    move_count: usize,
    requested_at: Instant,
    response: Option<Option<usize>>,
}

/// The interactive side of an automated player
pub struct AiPlayer {
    player: Player,
    requests: Option<Sender<Envelope<Request>>>,
    responses: Receiver<Envelope<Response>>,
    sequence: u64,
    pending: Option<Pending>,
    // move count of the last position a plan was requested for
    planned_for: Option<usize>,
    min_move_delay: Duration,
    terminated: bool,
}

impl AiPlayer {
    /// Starts a worker thread playing as `player`
    pub fn spawn<F: MoveFilter + Send + 'static>(
        player: Player,
        filter: F,
        min_move_delay: Duration,
    ) -> Result<Self> {
        let (request_tx, request_rx) = channel();
        let (response_tx, response_rx) = channel();

        // the thread is detached, it exits when its request channel closes
        thread::Builder::new()
            .name(format!("ai-player-{}", player))
            .spawn(move || run_worker(player, Solver::new(filter), request_rx, response_tx))?;
        info!("started worker for player {}", player);

        Ok(Self {
            player,
            requests: Some(request_tx),
            responses: response_rx,
            sequence: 0,
            pending: None,
            planned_for: None,
            min_move_delay,
            terminated: false,
        })
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// True while a move has been requested for the board's current position
    pub fn is_waiting(&self, board: &Board) -> bool {
        self.pending
            .as_ref()
            .map_or(false, |pending| pending.move_count == board.move_count())
    }

    fn send(&mut self, board: &Board, body: Request) -> u64 {
        self.sequence += 1;
        let envelope = Envelope {
            sequence: self.sequence,
            player: self.player,
            move_count: board.move_count(),
            body,
        };
        if let Some(requests) = &self.requests {
            if requests.send(envelope).is_err() {
                debug!("player {} worker is no longer running", self.player);
            }
        }
        self.sequence
    }

    /// Asks the worker for a move on `board`
    ///
    /// Does nothing if it is not this player's turn or a move for this position
    /// is already on its way.
    pub fn take_turn(&mut self, board: &Board) {
        if self.terminated
            || board.current_player() != Some(self.player)
            || self.is_waiting(board)
        {
            return;
        }
        let sequence = self.send(board, Request::RequestMove(board.to_snapshot()));
        self.pending = Some(Pending {
            sequence,
            move_count: board.move_count(),
            requested_at: Instant::now(),
            response: None,
        });
    }

    /// Asks the worker to plan replies while the opponent is to move
    ///
    /// Only the first request for a position is sent.
    pub fn plan(&mut self, board: &Board) {
        if self.terminated
            || board.game_over()
            || self.planned_for == Some(board.move_count())
        {
            return;
        }
        self.planned_for = Some(board.move_count());
        self.send(board, Request::RequestPlan(board.to_snapshot()));
    }

    /// Resynchronises the worker with a new game
    pub fn reset(&mut self, board: &Board) {
        if self.terminated {
            return;
        }
        self.pending = None;
        self.planned_for = None;
        self.send(board, Request::Reset);
    }

    // whether a move response still applies to the live board
    fn accepts(&self, envelope: &Envelope<Response>, board: &Board) -> bool {
        let pending = match &self.pending {
            Some(pending) => pending,
            None => return false,
        };
        envelope.player == self.player
            && board.current_player() == Some(self.player)
            && envelope.sequence == pending.sequence
            && envelope.move_count == board.move_count()
    }

    /// Processes the worker's replies
    ///
    /// Reports the column to play once a valid move has arrived and the
    /// minimum move delay has passed. Stale replies are dropped.
    pub fn poll(&mut self, board: &Board) -> TurnStatus {
        if self.terminated {
            return TurnStatus::NoMove;
        }

        loop {
            let envelope = match self.responses.try_recv() {
                Ok(envelope) => envelope,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("player {} worker disconnected", self.player);
                    self.terminate();
                    return TurnStatus::NoMove;
                }
            };

            match envelope.body {
                Response::MoveReady(column) => {
                    if self.accepts(&envelope, board) {
                        if let Some(pending) = &mut self.pending {
                            pending.response = Some(column);
                        }
                    } else {
                        debug!(
                            "player {} dropping stale move {:?} (request {})",
                            self.player, column, envelope.sequence
                        );
                    }
                }
                Response::PlanReady => {
                    // the opponent may have moved while the plan was made
                    self.take_turn(board);
                }
            }
        }

        let ready = match &self.pending {
            Some(pending) => {
                pending.response.is_some()
                    && pending.move_count == board.move_count()
                    && board.current_player() == Some(self.player)
                    && pending.requested_at.elapsed() >= self.min_move_delay
            }
            None => false,
        };
        if !ready {
            return TurnStatus::Waiting;
        }

        match self.pending.take().and_then(|pending| pending.response).flatten() {
            Some(column) => TurnStatus::Move(column),
            None => {
                warn!("player {} worker found no move", self.player);
                TurnStatus::NoMove
            }
        }
    }

    /// Blocks until [`poll`](AiPlayer::poll) settles the turn or `timeout` passes
    pub fn wait(&mut self, board: &Board, timeout: Duration) -> Option<usize> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.poll(board) {
                TurnStatus::Move(column) => return Some(column),
                TurnStatus::NoMove => return None,
                TurnStatus::Waiting if Instant::now() >= deadline => return None,
                TurnStatus::Waiting => thread::sleep(POLL_INTERVAL),
            }
        }
    }

    /// Stops the worker. Replies still in flight are ignored
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.pending = None;
        // closing the channel ends the worker loop once its current search is done
        self.requests = None;
        info!("terminated worker for player {}", self.player);
    }
}

impl Drop for AiPlayer {
    fn drop(&mut self) {
        self.terminate();
    }
}
