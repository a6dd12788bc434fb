//! # nodewar
//!
//! A deterministic engine for turn-based strategy games played on a weighted
//! graph of positions.
//!
//! ## Design Principles
//!
//! 1. **Single Entry Point**: Every change to a game goes through
//!    `Game::submit`, which validates, applies and records one action
//!    atomically. A rejected action leaves no trace.
//!
//! 2. **Deterministic Replay**: The same initial state and the same actions
//!    always produce the same states. Stored games are verified by replay
//!    when they are loaded.
//!
//! 3. **Injected Collaborators**: Storage and victory rules are traits
//!    supplied by the host. The engine performs no I/O of its own.
//!
//! ## Architecture
//!
//! - **Flat Topology**: Nodes are indexed by id and adjacency is a map of
//!   ids, so nodes never reference each other.
//!
//! - **Persistent Data Structures**: Boards and history use `im-rs`, so each
//!   turn's snapshot shares structure with the previous one.
//!
//! - **Per-Game Serialization**: `GameService` puts each game behind its own
//!   async mutex; different games run fully in parallel.
//!
//! ## Modules
//!
//! - `core`: Ids, players, actions, state, RNG, configuration
//! - `graph`: Weighted topology with shortest-path and traversal algorithms
//! - `board`: Units, occupancy, movement and combat; board templates
//! - `rules`: Game results and terminal conditions
//! - `game`: The turn state machine and its persisted form
//! - `persistence`: Storage port and in-memory adapter
//! - `service`: Async multi-game façade
//!
//! ## Example
//!
//! ```
//! use nodewar::{Action, ActionId, BoardTemplate, Game, GameConfig, GameId, NodeId, PlayerId, UnitId};
//!
//! let (alice, bob) = (PlayerId::new(1), PlayerId::new(2));
//! let mut game = Game::create(GameId::new(1), BoardTemplate::line(), GameConfig::default(), [alice, bob])?;
//!
//! let state = game.submit(alice, Action::move_to(ActionId::new(1), UnitId::new(2), NodeId::new(4)))?;
//! assert_eq!(state.turn, 1);
//! assert_eq!(state.active_player, Some(bob));
//! # Ok::<(), nodewar::EngineError>(())
//! ```

pub mod board;
pub mod core;
pub mod error;
pub mod game;
pub mod graph;
pub mod persistence;
pub mod rules;
pub mod service;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionId, ActionKind, ActionRecord, GameConfig, GameId, GamePhase, GameRng, NodeId,
    PlayerId, State, TurnOrder, UnitId,
};

pub use crate::error::{EngineError, Result};

pub use crate::graph::{Cost, Edge, GraphData, Node, NodeGraph, Path, ReachableSet, Weight};

pub use crate::board::{
    AttackOutcome, Board, BoardDelta, BoardTemplate, TemplateRegistry, Unit, UnitSpec, UnitStatus,
};

pub use crate::rules::{GameResult, LastPlayerStanding, TurnLimit, WinCondition};

pub use crate::game::{Game, GameHeader, GameSnapshot};

pub use crate::persistence::{GameStore, InMemoryStore, StorageError};

pub use crate::service::{GameService, ServiceConfig, Submission};
