//! Game phases and immutable turn snapshots.
//!
//! ## GamePhase
//!
//! `AwaitingPlayers → InProgress → Completed`, never backwards.
//!
//! ## State
//!
//! One snapshot per turn: turn number, timestamp, a full copy of the board,
//! whose turn is next, the phase and result, and the action that produced it
//! (absent for the initial state). Boards are built from `im` persistent maps,
//! so the copy shares structure with the previous turn.
//!
//! States are created by `Game` and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::ActionRecord;
use super::player::PlayerId;
use crate::board::Board;
use crate::rules::GameResult;

/// Lifecycle phase of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the minimum number of players.
    #[default]
    AwaitingPlayers,
    /// Players take turns submitting actions.
    InProgress,
    /// A terminal condition held. No further actions are accepted.
    Completed,
}

/// Immutable snapshot of a game at one turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Turn number; the initial state is turn 0.
    pub turn: u32,

    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Board contents after this turn.
    pub board: Board,

    /// Seat whose turn it is next.
    pub active_seat: usize,

    /// Player whose turn it is next. `None` once the game is complete.
    pub active_player: Option<PlayerId>,

    /// Phase after this turn.
    pub phase: GamePhase,

    /// Outcome, once the game is complete.
    pub result: Option<GameResult>,

    /// The action that produced this state. `None` for the initial state.
    pub record: Option<ActionRecord>,
}

impl State {
    /// Snapshot of a freshly started game.
    #[must_use]
    pub fn initial(board: Board, active_seat: usize, active_player: PlayerId, at: DateTime<Utc>) -> Self {
        Self {
            turn: 0,
            timestamp: at,
            board,
            active_seat,
            active_player: Some(active_player),
            phase: GamePhase::InProgress,
            result: None,
            record: None,
        }
    }

    /// Whether this snapshot ends the game.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase == GamePhase::Completed
    }

    /// Compare everything except the timestamp.
    ///
    /// Replaying the same actions reproduces states that are equal under
    /// this comparison.
    #[must_use]
    pub fn same_position(&self, other: &State) -> bool {
        self.turn == other.turn
            && self.board == other.board
            && self.active_seat == other.active_seat
            && self.active_player == other.active_player
            && self.phase == other.phase
            && self.result == other.result
            && self.record == other.record
    }
}
