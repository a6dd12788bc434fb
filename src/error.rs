//! Error types for the engine.
//!
//! Every engine operation returns an explicit `Result`. Validation errors
//! leave the board and history untouched; structural errors mean the affected
//! game or graph cannot be used until fixed; storage errors come from the
//! persistence collaborator and never roll back an applied action.

use thiserror::Error;

use crate::core::{GameId, NodeId, PlayerId, UnitId};
use crate::persistence::StorageError;

/// Main error type for the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    // === Validation ===
    #[error("it is not {player}'s turn")]
    WrongTurn { player: PlayerId },

    #[error("{unit} does not exist")]
    UnitNotFound { unit: UnitId },

    #[error("{node} does not exist")]
    NodeNotFound { node: NodeId },

    #[error("{node} is already occupied by {occupant}")]
    OccupiedNode { node: NodeId, occupant: UnitId },

    #[error("{to} is not reachable from {from}")]
    Unreachable { from: NodeId, to: NodeId },

    #[error("{target} is not a valid target: {reason}")]
    InvalidTarget { target: UnitId, reason: &'static str },

    #[error("game is already complete")]
    GameAlreadyComplete,

    #[error("{unit} is not owned by {player}")]
    NotUnitOwner { unit: UnitId, player: PlayerId },

    #[error("{unit} is defeated and cannot act")]
    UnitDefeated { unit: UnitId },

    #[error("{unit} is not on the board")]
    UnitNotPlaced { unit: UnitId },

    #[error("game has not started")]
    GameNotStarted,

    #[error("game is full ({seats} seats)")]
    GameFull { seats: usize },

    #[error("{player} is not seated in this game")]
    UnknownPlayer { player: PlayerId },

    #[error("{player} is already seated in this game")]
    DuplicatePlayer { player: PlayerId },

    #[error("players can only join or leave before the game starts")]
    LobbyClosed,

    // === Topology ===
    #[error("{node} already exists")]
    DuplicateNode { node: NodeId },

    #[error("{node} is occupied by {occupant} and cannot be removed")]
    NodeInUse { node: NodeId, occupant: UnitId },

    #[error("{unit} already exists")]
    DuplicateUnit { unit: UnitId },

    #[error("unknown board variant '{variant}'")]
    UnknownVariant { variant: String },

    #[error("invalid board template '{variant}': {reason}")]
    InvalidTemplate { variant: String, reason: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    // === Structural ===
    #[error("corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    #[error("{game} not found")]
    GameNotFound { game: GameId },

    // === Infrastructure ===
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Build a `CorruptSnapshot` error.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        EngineError::CorruptSnapshot {
            reason: reason.into(),
        }
    }

    /// Whether the caller can recover by submitting a different action.
    ///
    /// Validation failures never modify the game.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::WrongTurn { .. }
                | EngineError::UnitNotFound { .. }
                | EngineError::NodeNotFound { .. }
                | EngineError::OccupiedNode { .. }
                | EngineError::Unreachable { .. }
                | EngineError::InvalidTarget { .. }
                | EngineError::GameAlreadyComplete
                | EngineError::NotUnitOwner { .. }
                | EngineError::UnitDefeated { .. }
                | EngineError::UnitNotPlaced { .. }
        )
    }
}

/// Convenience type alias for Results using the engine's error type.
pub type Result<T> = std::result::Result<T, EngineError>;
