//! Storage port.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{GameId, State};
use crate::game::{GameHeader, GameSnapshot};

/// Failure reported by a `GameStore`.
///
/// Storage failures never roll back an applied action; the in-memory game
/// stays authoritative and the save can be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("no stored record for {game}")]
    NotFound { game: GameId },

    #[error("storage round-trip timed out")]
    Timeout,

    #[error("failed to encode or decode record: {reason}")]
    Codec { reason: String },

    #[error("storage backend failed: {message}")]
    Backend { message: String },
}

impl StorageError {
    /// Build a `Backend` error.
    pub fn backend(message: impl Into<String>) -> Self {
        StorageError::Backend {
            message: message.into(),
        }
    }
}

/// Result alias for storage calls.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Port for persisting games.
///
/// A game is written as a header once play starts, followed by one `save`
/// per state in turn order. Saving a turn that is already stored replaces
/// it, so retries are safe.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Store the header of a started game.
    ///
    /// Re-registering the same header keeps the stored states. A different
    /// header starts the record over, dropping every stored state.
    async fn register(&self, game: GameId, header: &GameHeader) -> StorageResult<()>;

    /// Append `state` to the game's history.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the game was never registered
    /// - `Backend` if `state.turn` would leave a gap in the stored history
    async fn save(&self, game: GameId, state: &State) -> StorageResult<()>;

    /// Load the header and every stored state.
    async fn load(&self, game: GameId) -> StorageResult<GameSnapshot>;

    /// Whether any record exists for `game`.
    async fn contains(&self, game: GameId) -> StorageResult<bool> {
        match self.load(game).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
