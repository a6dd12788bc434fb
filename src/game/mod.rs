//! Games: the turn state machine and its persisted form.

#[allow(clippy::module_inception)]
pub mod game;
pub mod snapshot;

pub use game::Game;
pub use snapshot::{GameHeader, GameSnapshot};
pub use crate::core::GamePhase;
