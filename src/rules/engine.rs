//! Terminal conditions.
//!
//! After every applied action `Game` asks its `WinCondition` whether play is
//! over. The default, `LastPlayerStanding`, ends the game when at most one
//! player still has active units. Hosts may supply their own predicate
//! (capture a node, survive N turns, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::core::PlayerId;

/// Result of a completed game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Draw (no winner).
    Draw,
    /// Multiple winners (team games, shared victory).
    Winners(Vec<PlayerId>),
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        match self {
            GameResult::Winner(p) => *p == player,
            GameResult::Winners(ps) => ps.contains(&player),
            GameResult::Draw => false,
        }
    }
}

/// Host-suppliable terminal predicate.
///
/// Must be deterministic: replaying the same actions must end the game on
/// the same turn.
pub trait WinCondition: Send + Sync + fmt::Debug {
    /// Return `Some(result)` if the game is over after `turn`.
    fn evaluate(&self, board: &Board, players: &[PlayerId], turn: u32) -> Option<GameResult>;
}

/// Ends the game once at most one player has active units.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastPlayerStanding;

impl WinCondition for LastPlayerStanding {
    fn evaluate(&self, board: &Board, players: &[PlayerId], _turn: u32) -> Option<GameResult> {
        let mut alive = players.iter().copied().filter(|&p| board.has_active_units(p));
        match (alive.next(), alive.next()) {
            (None, _) => Some(GameResult::Draw),
            (Some(p), None) => Some(GameResult::Winner(p)),
            _ => None,
        }
    }
}

/// Ends the game after a fixed number of turns if nobody has won sooner;
/// the players with the most total unit power share the win.
#[derive(Clone, Copy, Debug)]
pub struct TurnLimit {
    pub max_turns: u32,
}

impl WinCondition for TurnLimit {
    fn evaluate(&self, board: &Board, players: &[PlayerId], turn: u32) -> Option<GameResult> {
        if let Some(result) = LastPlayerStanding.evaluate(board, players, turn) {
            return Some(result);
        }
        if turn < self.max_turns {
            return None;
        }

        let strength = |p: PlayerId| -> u64 { board.active_units_of(p).map(|u| u64::from(u.power)).sum() };
        let best = players.iter().map(|&p| strength(p)).max().unwrap_or(0);
        let leaders: Vec<PlayerId> = players.iter().copied().filter(|&p| strength(p) == best).collect();

        Some(match leaders.as_slice() {
            [single] => GameResult::Winner(*single),
            _ => GameResult::Winners(leaders),
        })
    }
}
