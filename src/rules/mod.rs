//! Game outcome rules.
//!
//! `Game` consults a `WinCondition` after every applied action:
//! - `LastPlayerStanding` (default): one player left with active units
//! - `TurnLimit`: last player standing, or strongest side after N turns
//!
//! Hosts can implement `WinCondition` for their own victory rules.

pub mod engine;

pub use engine::{GameResult, LastPlayerStanding, TurnLimit, WinCondition};
