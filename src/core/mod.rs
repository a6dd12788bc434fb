//! Core engine types: identifiers, players, actions, state, RNG, configuration.
//!
//! These are the building blocks every other module shares. Rules that vary
//! between games are set through `GameConfig` rather than by changing the core.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod action;
pub mod state;

pub use entity::{ActionId, GameId, NodeId, UnitId};
pub use player::{PlayerId, TurnOrder};
pub use rng::GameRng;
pub use config::{GameConfig, DEFAULT_ATTACK_RANGE, DEFAULT_MOVEMENT};
pub use action::{Action, ActionKind, ActionRecord};
pub use state::{GamePhase, State};
