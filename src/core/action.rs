//! Actions: tagged commands with a validate-then-apply contract.
//!
//! An action is a discriminant plus payload (`ActionKind`) and a caller-chosen
//! `ActionId`. Every variant goes through the same two phases:
//!
//! 1. `validate(board, player, config)`: pure check, never mutates.
//! 2. `apply(board, config)`: performs the change on a working copy of the
//!    board and swaps it in only on success, returning the `BoardDelta`.
//!
//! New variants extend `ActionKind` and its two `match`es; all board writes
//! still go through `Board`, which enforces occupancy and status rules.
//!
//! ```
//! use nodewar::core::{Action, ActionId, NodeId, UnitId};
//!
//! let step = Action::move_to(ActionId::new(1), UnitId::new(3), NodeId::new(7));
//! assert_eq!(step.actor(), Some(UnitId::new(3)));
//! ```

use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use super::entity::{ActionId, NodeId, UnitId};
use super::player::PlayerId;
use crate::board::{Board, BoardDelta};
use crate::error::{EngineError, Result};

/// Action discriminant and payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move `unit` to `destination` within its movement budget.
    Move { unit: UnitId, destination: NodeId },
    /// `unit` strikes `target` within attack range.
    Attack { unit: UnitId, target: UnitId },
    /// Spend the turn without changing the board.
    Pass,
}

/// A submitted command.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub kind: ActionKind,
}

impl Action {
    /// Create an action.
    #[must_use]
    pub fn new(id: ActionId, kind: ActionKind) -> Self {
        Self { id, kind }
    }

    /// Move action.
    #[must_use]
    pub fn move_to(id: ActionId, unit: UnitId, destination: NodeId) -> Self {
        Self::new(id, ActionKind::Move { unit, destination })
    }

    /// Attack action.
    #[must_use]
    pub fn attack(id: ActionId, unit: UnitId, target: UnitId) -> Self {
        Self::new(id, ActionKind::Attack { unit, target })
    }

    /// Pass action.
    #[must_use]
    pub fn pass(id: ActionId) -> Self {
        Self::new(id, ActionKind::Pass)
    }

    /// The acting unit, if the variant has one.
    #[must_use]
    pub fn actor(&self) -> Option<UnitId> {
        match self.kind {
            ActionKind::Move { unit, .. } | ActionKind::Attack { unit, .. } => Some(unit),
            ActionKind::Pass => None,
        }
    }

    /// Check the action against `board` on behalf of `player`.
    ///
    /// Pure: the board is not modified.
    pub fn validate(&self, board: &Board, player: PlayerId, config: &GameConfig) -> Result<()> {
        if let Some(actor) = self.actor() {
            let unit = board
                .unit(actor)
                .ok_or(EngineError::UnitNotFound { unit: actor })?;
            if unit.owner != player {
                return Err(EngineError::NotUnitOwner {
                    unit: actor,
                    player,
                });
            }
            if !unit.is_active() {
                return Err(EngineError::UnitDefeated { unit: actor });
            }
        }

        match self.kind {
            ActionKind::Move { unit, destination } => board.reach(unit, destination).map(|_| ()),
            ActionKind::Attack { unit, target } => {
                board.check_attack(unit, target, config.attack_range)
            }
            ActionKind::Pass => Ok(()),
        }
    }

    /// Apply the action. Assumes `validate` passed, but every board
    /// precondition is checked again; on error `board` is unchanged.
    pub fn apply(&self, board: &mut Board, config: &GameConfig) -> Result<BoardDelta> {
        let mut next = board.clone();
        let delta = match self.kind {
            ActionKind::Move { unit, destination } => next.move_unit(unit, destination)?,
            ActionKind::Attack { unit, target } => {
                next.resolve_attack(unit, target, config.attack_range)?
            }
            ActionKind::Pass => BoardDelta::Unchanged,
        };
        *board = next;
        Ok(delta)
    }
}

/// A successfully applied action, kept in history for replay and audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The player who took this action.
    pub player: PlayerId,

    /// The action taken.
    pub action: Action,

    /// Turn number the action produced.
    pub turn: u32,

    /// What changed on the board.
    pub delta: BoardDelta,
}

impl ActionRecord {
    /// Create a new action record.
    #[must_use]
    pub fn new(player: PlayerId, action: Action, turn: u32, delta: BoardDelta) -> Self {
        Self {
            player,
            action,
            turn,
            delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Unit;
    use crate::graph::{Node, NodeGraph};

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    fn board() -> Board {
        let mut graph = NodeGraph::new();
        for i in 1..=3 {
            graph.add_node(Node::new(NodeId(i))).unwrap();
        }
        graph.add_edge(NodeId(1), NodeId(2), 1).unwrap();
        graph.add_edge(NodeId(2), NodeId(3), 1).unwrap();

        let mut board = Board::new("test", graph);
        board
            .add_unit(Unit::new(UnitId(1), "A", P1).with_power(5).with_movement(1), NodeId(1))
            .unwrap();
        board
            .add_unit(Unit::new(UnitId(2), "B", P2).with_power(3).with_movement(1), NodeId(3))
            .unwrap();
        board
    }

    #[test]
    fn test_validate_rejects_foreign_unit() {
        let action = Action::move_to(ActionId(1), UnitId(2), NodeId(2));
        assert_eq!(
            action.validate(&board(), P1, &GameConfig::default()),
            Err(EngineError::NotUnitOwner {
                unit: UnitId(2),
                player: P1
            })
        );
    }

    #[test]
    fn test_validate_unknown_unit() {
        let action = Action::attack(ActionId(1), UnitId(9), UnitId(2));
        assert_eq!(
            action.validate(&board(), P1, &GameConfig::default()),
            Err(EngineError::UnitNotFound { unit: UnitId(9) })
        );
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let board = board();
        let before = board.clone();
        let action = Action::move_to(ActionId(1), UnitId(1), NodeId(2));
        action.validate(&board, P1, &GameConfig::default()).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn test_apply_move_then_attack() {
        let mut board = board();
        let config = GameConfig::default();

        let step = Action::move_to(ActionId(1), UnitId(1), NodeId(2));
        let delta = step.apply(&mut board, &config).unwrap();
        assert_eq!(
            delta,
            BoardDelta::Moved {
                unit: UnitId(1),
                from: NodeId(1),
                to: NodeId(2),
                cost: 1
            }
        );

        let strike = Action::attack(ActionId(2), UnitId(1), UnitId(2));
        strike.validate(&board, P1, &config).unwrap();
        strike.apply(&mut board, &config).unwrap();
        assert!(!board.unit(UnitId(2)).unwrap().is_active());
    }

    #[test]
    fn test_apply_failure_leaves_board_unchanged() {
        let mut board = board();
        let before = board.clone();

        // Out of movement budget.
        let action = Action::move_to(ActionId(1), UnitId(1), NodeId(3));
        assert!(action.apply(&mut board, &GameConfig::default()).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_pass_changes_nothing() {
        let mut board = board();
        let before = board.clone();
        let delta = Action::pass(ActionId(3))
            .apply(&mut board, &GameConfig::default())
            .unwrap();
        assert_eq!(delta, BoardDelta::Unchanged);
        assert_eq!(board, before);
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::attack(ActionId(4), UnitId(1), UnitId(2));
        let json = serde_json::to_string(&action).unwrap();
        let deserialized: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, deserialized);
    }
}
