//! Persisted game records.
//!
//! A game is stored as a `GameHeader` (written once, when play starts) plus
//! its `State` history (appended one state per turn). `GameSnapshot` bundles
//! the two for rehydration through `Game::restore`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{GameConfig, GameId, PlayerId, State};

/// Data fixed for the lifetime of a started game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHeader {
    pub id: GameId,

    /// Board variant the game was created from.
    pub variant: String,

    pub config: GameConfig,

    /// Seated players in turn order.
    pub players: Vec<PlayerId>,

    pub created_at: DateTime<Utc>,
}

/// Everything needed to rehydrate a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub header: GameHeader,

    /// States in turn order, starting with the initial state.
    pub history: Vec<State>,
}

impl GameSnapshot {
    /// Bundle a header with its history.
    #[must_use]
    pub fn new(header: GameHeader, history: Vec<State>) -> Self {
        Self { header, history }
    }

    /// The most recent state, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&State> {
        self.history.last()
    }
}
