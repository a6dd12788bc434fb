//! Game configuration.
//!
//! Hosts configure rules at game creation via `GameConfig`:
//! - how many players a game needs before it starts
//! - default unit movement budget and attack range
//! - whether allied units may be passed through during a move
//!
//! The numeric defaults are game-design choices, not engine constraints.

use serde::{Deserialize, Serialize};

/// Default movement budget for units whose template omits one.
pub const DEFAULT_MOVEMENT: u32 = 2;

/// Default attack range in hops (direct adjacency).
pub const DEFAULT_ATTACK_RANGE: u32 = 1;

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Players required before the game leaves `AwaitingPlayers`.
    pub min_players: usize,

    /// Maximum players. `None` means "one per template seat".
    pub max_players: Option<usize>,

    /// Movement budget assigned to units that do not specify one.
    pub default_movement: u32,

    /// Maximum hop distance between attacker and target.
    pub attack_range: u32,

    /// Allow moves to path through nodes held by the mover's own units.
    /// Enemy-held nodes always block.
    pub pass_through_allies: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: None,
            default_movement: DEFAULT_MOVEMENT,
            attack_range: DEFAULT_ATTACK_RANGE,
            pass_through_allies: true,
        }
    }
}

impl GameConfig {
    /// Create a configuration with default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum player count.
    #[must_use]
    pub fn with_min_players(mut self, count: usize) -> Self {
        assert!(count > 0, "Must require at least 1 player");
        self.min_players = count;
        self
    }

    /// Set the maximum player count.
    #[must_use]
    pub fn with_max_players(mut self, count: usize) -> Self {
        assert!(count > 0, "Must allow at least 1 player");
        self.max_players = Some(count);
        self
    }

    /// Set the default movement budget.
    #[must_use]
    pub fn with_default_movement(mut self, budget: u32) -> Self {
        self.default_movement = budget;
        self
    }

    /// Set the attack range in hops.
    #[must_use]
    pub fn with_attack_range(mut self, hops: u32) -> Self {
        self.attack_range = hops;
        self
    }

    /// Forbid moving through allied units.
    #[must_use]
    pub fn blocking_allies(mut self) -> Self {
        self.pass_through_allies = false;
        self
    }

    /// Effective maximum players for a template with `seats` deployments.
    #[must_use]
    pub fn seat_limit(&self, seats: usize) -> usize {
        self.max_players.map_or(seats, |max| max.min(seats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.default_movement, DEFAULT_MOVEMENT);
        assert_eq!(config.attack_range, 1);
        assert!(config.pass_through_allies);
    }

    #[test]
    fn test_builder() {
        let config = GameConfig::new()
            .with_min_players(3)
            .with_max_players(4)
            .with_default_movement(5)
            .with_attack_range(2)
            .blocking_allies();

        assert_eq!(config.min_players, 3);
        assert_eq!(config.max_players, Some(4));
        assert_eq!(config.default_movement, 5);
        assert_eq!(config.attack_range, 2);
        assert!(!config.pass_through_allies);
    }

    #[test]
    fn test_seat_limit() {
        assert_eq!(GameConfig::default().seat_limit(4), 4);
        assert_eq!(GameConfig::default().with_max_players(2).seat_limit(4), 2);
        assert_eq!(GameConfig::default().with_max_players(8).seat_limit(4), 4);
    }

    #[test]
    #[should_panic(expected = "Must require at least 1 player")]
    fn test_zero_min_players() {
        let _ = GameConfig::new().with_min_players(0);
    }

    #[test]
    fn test_serialization() {
        let config = GameConfig::new().with_attack_range(3);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
