//! Board: a topology plus the units occupying it.
//!
//! ## Invariants
//!
//! - At most one unit holds a node, and only active units hold nodes.
//! - A unit's `position` names a node whose `occupant` is that unit, and
//!   every occupant names a unit positioned there.
//!
//! Every mutating method checks all of its preconditions before writing
//! anything, so a failed call leaves the board exactly as it was. `validate`
//! re-checks the invariants from scratch for boards decoded from storage.

use im::OrdMap;
use serde::{Deserialize, Serialize};

use super::unit::{AttackOutcome, Unit};
use crate::core::{NodeId, PlayerId, UnitId};
use crate::error::{EngineError, Result};
use crate::graph::{Cost, NodeGraph, ReachableSet};

/// A change produced by applying an action, recorded in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardDelta {
    /// A unit moved between nodes.
    Moved {
        unit: UnitId,
        from: NodeId,
        to: NodeId,
        cost: Cost,
    },
    /// A unit attacked another.
    Attacked {
        attacker: UnitId,
        target: UnitId,
        outcome: AttackOutcome,
        /// Node cleared because the target was defeated.
        vacated: Option<NodeId>,
    },
    /// The action left the board as it was.
    Unchanged,
}

/// Topology plus units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    variant: String,
    graph: NodeGraph,
    units: OrdMap<UnitId, Unit>,
    pass_through_allies: bool,
}

impl Board {
    /// Create an empty board over `graph`.
    pub fn new(variant: impl Into<String>, graph: NodeGraph) -> Self {
        Self {
            variant: variant.into(),
            graph,
            units: OrdMap::new(),
            pass_through_allies: true,
        }
    }

    /// Forbid or allow moving through allied units.
    #[must_use]
    pub fn with_pass_through_allies(mut self, allowed: bool) -> Self {
        self.pass_through_allies = allowed;
        self
    }

    /// Name of the topology this board was built from.
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// The underlying topology.
    #[must_use]
    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Mutable topology for map editing.
    ///
    /// Node removal refuses occupied nodes, so occupancy stays consistent.
    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    // === Queries ===

    /// Look up a unit by id (active or defeated).
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// The unit holding `node`, if any.
    #[must_use]
    pub fn unit_at(&self, node: NodeId) -> Option<&Unit> {
        self.graph.occupant(node).and_then(|id| self.units.get(&id))
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Active units owned by `player`.
    pub fn active_units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units
            .values()
            .filter(move |u| u.owner == player && u.is_active())
    }

    /// Whether `player` still has a unit in play.
    #[must_use]
    pub fn has_active_units(&self, player: PlayerId) -> bool {
        self.active_units_of(player).next().is_some()
    }

    fn active_unit(&self, id: UnitId) -> Result<&Unit> {
        let unit = self.unit(id).ok_or(EngineError::UnitNotFound { unit: id })?;
        if !unit.is_active() {
            return Err(EngineError::UnitDefeated { unit: id });
        }
        Ok(unit)
    }

    fn require_free(&self, node: NodeId) -> Result<()> {
        let n = self
            .graph
            .node(node)
            .ok_or(EngineError::NodeNotFound { node })?;
        match n.occupant {
            Some(occupant) => Err(EngineError::OccupiedNode { node, occupant }),
            None => Ok(()),
        }
    }

    fn passable_for(&self, owner: PlayerId) -> impl Fn(NodeId) -> bool + '_ {
        move |node| match self.unit_at(node) {
            None => true,
            Some(u) => self.pass_through_allies && u.owner == owner,
        }
    }

    // === Placement ===

    /// Add a new unit and place it on `node`.
    pub fn add_unit(&mut self, mut unit: Unit, node: NodeId) -> Result<()> {
        if self.units.contains_key(&unit.id) {
            return Err(EngineError::DuplicateUnit { unit: unit.id });
        }
        if !unit.is_active() {
            return Err(EngineError::UnitDefeated { unit: unit.id });
        }
        self.require_free(node)?;

        unit.position = Some(node);
        self.graph.set_occupant(node, Some(unit.id))?;
        self.units.insert(unit.id, unit);
        Ok(())
    }

    /// Place an existing active unit on `node`, leaving its current node.
    ///
    /// Fails with `OccupiedNode` if another unit holds `node`.
    pub fn place_unit(&mut self, id: UnitId, node: NodeId) -> Result<()> {
        let from = self.active_unit(id)?.position;
        if from == Some(node) {
            return Ok(());
        }
        self.require_free(node)?;

        if let Some(from) = from {
            self.graph.set_occupant(from, None)?;
        }
        self.graph.set_occupant(node, Some(id))?;
        if let Some(unit) = self.units.get_mut(&id) {
            unit.position = Some(node);
        }
        Ok(())
    }

    /// Clear a node's occupancy. Returns the unit that was there.
    ///
    /// The unit stays on the board without a position until placed again.
    pub fn vacate(&mut self, node: NodeId) -> Result<Option<UnitId>> {
        let occupant = self
            .graph
            .node(node)
            .ok_or(EngineError::NodeNotFound { node })?
            .occupant;

        self.graph.set_occupant(node, None)?;
        if let Some(unit) = occupant.and_then(|id| self.units.get_mut(&id)) {
            unit.position = None;
        }
        Ok(occupant)
    }

    // === Movement ===

    /// Cost for `unit` to move to `destination`, or the reason it cannot.
    ///
    /// The destination must be free and within the unit's movement budget.
    /// Enemy-held nodes block passage; allied ones do too unless pass-through
    /// is allowed.
    pub fn reach(&self, unit: UnitId, destination: NodeId) -> Result<Cost> {
        let mover = self.active_unit(unit)?;
        let from = mover.position.ok_or(EngineError::UnitNotPlaced { unit })?;
        self.require_free(destination)?;

        let reachable = self.graph.reachable_set_where(
            from,
            Cost::from(mover.movement),
            self.passable_for(mover.owner),
        )?;
        reachable
            .get(&destination)
            .copied()
            .ok_or(EngineError::Unreachable {
                from,
                to: destination,
            })
    }

    /// Whether `unit` can legally move to `destination` right now.
    #[must_use]
    pub fn can_reach(&self, unit: UnitId, destination: NodeId) -> bool {
        self.reach(unit, destination).is_ok()
    }

    /// Every free node `unit` could move to, with its cost.
    pub fn move_options(&self, unit: UnitId) -> Result<ReachableSet> {
        let mover = self.active_unit(unit)?;
        let from = mover.position.ok_or(EngineError::UnitNotPlaced { unit })?;
        let mut reachable = self.graph.reachable_set_where(
            from,
            Cost::from(mover.movement),
            self.passable_for(mover.owner),
        )?;
        reachable.retain(|&node, _| self.graph.occupant(node).is_none());
        Ok(reachable)
    }

    /// Move a unit, checking reachability first.
    pub fn move_unit(&mut self, unit: UnitId, destination: NodeId) -> Result<BoardDelta> {
        let cost = self.reach(unit, destination)?;
        let from = self
            .unit(unit)
            .and_then(|u| u.position)
            .ok_or(EngineError::UnitNotPlaced { unit })?;

        self.place_unit(unit, destination)?;
        Ok(BoardDelta::Moved {
            unit,
            from,
            to: destination,
            cost,
        })
    }

    // === Combat ===

    /// Check that `attacker` may strike `target` at `range` hops.
    pub fn check_attack(&self, attacker: UnitId, target: UnitId, range: u32) -> Result<()> {
        let a = self.active_unit(attacker)?;
        let t = self.unit(target).ok_or(EngineError::UnitNotFound { unit: target })?;

        if attacker == target {
            return Err(EngineError::InvalidTarget {
                target,
                reason: "a unit cannot attack itself",
            });
        }
        if !t.is_active() {
            return Err(EngineError::InvalidTarget {
                target,
                reason: "target is already defeated",
            });
        }
        if t.owner == a.owner {
            return Err(EngineError::InvalidTarget {
                target,
                reason: "target is an allied unit",
            });
        }

        let from = a.position.ok_or(EngineError::UnitNotPlaced { unit: attacker })?;
        let to = t.position.ok_or(EngineError::UnitNotPlaced { unit: target })?;
        match self.graph.hop_distance(from, to) {
            Some(hops) if hops <= range => Ok(()),
            _ => Err(EngineError::Unreachable { from, to }),
        }
    }

    /// Resolve an attack: damage the target and remove it if defeated.
    pub fn resolve_attack(&mut self, attacker: UnitId, target: UnitId, range: u32) -> Result<BoardDelta> {
        self.check_attack(attacker, target, range)?;

        let outcome = match (self.unit(attacker), self.unit(target)) {
            (Some(a), Some(t)) => a.strike(t),
            _ => return Err(EngineError::UnitNotFound { unit: target }),
        };
        let vacated = if outcome.defeated {
            self.unit(target).and_then(|t| t.position)
        } else {
            None
        };

        if let Some(node) = vacated {
            self.graph.set_occupant(node, None)?;
        }
        if let Some(t) = self.units.get_mut(&target) {
            t.suffer(&outcome);
        }

        Ok(BoardDelta::Attacked {
            attacker,
            target,
            outcome,
            vacated,
        })
    }

    // === Integrity ===

    /// Re-check every occupancy invariant.
    ///
    /// Returns `CorruptSnapshot` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        for unit in self.units.values() {
            match (unit.is_active(), unit.position) {
                (false, Some(node)) => {
                    return Err(EngineError::corrupt(format!(
                        "defeated {} still holds {node}",
                        unit.id
                    )));
                }
                (true, Some(node)) => {
                    let holder = self
                        .graph
                        .node(node)
                        .ok_or_else(|| {
                            EngineError::corrupt(format!("{} is on missing {node}", unit.id))
                        })?
                        .occupant;
                    if holder != Some(unit.id) {
                        return Err(EngineError::corrupt(format!(
                            "{} claims {node} but the node is held by {}",
                            unit.id,
                            holder.map_or_else(|| "nobody".to_string(), |h| h.to_string())
                        )));
                    }
                }
                _ => {}
            }
        }

        for node in self.graph.nodes() {
            if let Some(occupant) = node.occupant {
                let unit = self.units.get(&occupant).ok_or_else(|| {
                    EngineError::corrupt(format!("{} is held by unknown {occupant}", node.id))
                })?;
                if unit.position != Some(node.id) || !unit.is_active() {
                    return Err(EngineError::corrupt(format!(
                        "{} is held by {occupant}, which is not active there",
                        node.id
                    )));
                }
            }
        }
        Ok(())
    }
}
