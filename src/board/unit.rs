//! Units: positioned, owned entities with combat and movement attributes.
//!
//! ## Lifecycle
//!
//! `Active → Defeated` is one-way. A defeated unit has no position, cannot
//! act, and is ignored by reachability, occupancy and targeting queries.
//!
//! ## Damage model
//!
//! An attack reduces the defender's power by the attacker's power. If the
//! result is zero or less the defender is defeated.

use serde::{Deserialize, Serialize};

use crate::core::{NodeId, PlayerId, UnitId};

/// Unit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    #[default]
    Active,
    Defeated,
}

/// A unit on the board.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier within the board.
    pub id: UnitId,

    /// Display name.
    pub name: String,

    /// Combat strength.
    pub power: u32,

    /// Maximum cumulative step cost per move.
    pub movement: u32,

    /// Lifecycle status.
    pub status: UnitStatus,

    /// Owning player (relation only).
    pub owner: PlayerId,

    /// Node currently held. Always `None` for defeated units.
    pub position: Option<NodeId>,
}

/// Result of one unit striking another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Power removed from the defender.
    pub damage: u32,
    /// Defender's power after the strike.
    pub remaining_power: u32,
    /// Whether the defender is defeated.
    pub defeated: bool,
}

impl Unit {
    /// Create an active, unplaced unit with zero power and movement.
    pub fn new(id: UnitId, name: impl Into<String>, owner: PlayerId) -> Self {
        Self {
            id,
            name: name.into(),
            power: 0,
            movement: 0,
            status: UnitStatus::Active,
            owner,
            position: None,
        }
    }

    /// Set combat power.
    #[must_use]
    pub fn with_power(mut self, power: u32) -> Self {
        self.power = power;
        self
    }

    /// Set movement budget.
    #[must_use]
    pub fn with_movement(mut self, movement: u32) -> Self {
        self.movement = movement;
        self
    }

    /// Check if the unit is still in play.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UnitStatus::Active
    }

    /// Compute the effect of this unit striking `defender`.
    ///
    /// Pure: neither unit is modified.
    #[must_use]
    pub fn strike(&self, defender: &Unit) -> AttackOutcome {
        let remaining_power = defender.power.saturating_sub(self.power);
        AttackOutcome {
            damage: defender.power - remaining_power,
            remaining_power,
            defeated: remaining_power == 0,
        }
    }

    /// Apply a strike outcome to this unit as the defender.
    pub(crate) fn suffer(&mut self, outcome: &AttackOutcome) {
        self.power = outcome.remaining_power;
        if outcome.defeated {
            self.defeat();
        }
    }

    /// Mark the unit defeated and clear its position.
    ///
    /// The caller is responsible for clearing the node's occupancy.
    pub(crate) fn defeat(&mut self) {
        self.status = UnitStatus::Defeated;
        self.position = None;
    }
}
