//! Nodes and edges.
//!
//! A `Node` holds only its own data: identity, entry cost and occupant.
//! Adjacency lives in the owning `NodeGraph`, indexed by `NodeId`, so nodes
//! never reference each other directly.

use serde::{Deserialize, Serialize};

use crate::core::{NodeId, UnitId};

/// Weight of a single edge (non-negative by construction).
pub type Weight = u32;

/// Accumulated path cost.
pub type Cost = u64;

/// A position in the topology.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the graph.
    pub id: NodeId,

    /// Extra cost paid when a unit steps onto this node (terrain).
    #[serde(default)]
    pub cost: Weight,

    /// Unit currently holding this node, if any.
    #[serde(default)]
    pub occupant: Option<UnitId>,
}

impl Node {
    /// Create an empty node with zero entry cost.
    #[must_use]
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            cost: 0,
            occupant: None,
        }
    }

    /// Set the entry cost.
    #[must_use]
    pub fn with_cost(mut self, cost: Weight) -> Self {
        self.cost = cost;
        self
    }

    /// Check whether a unit holds this node.
    #[must_use]
    pub fn has_unit(&self) -> bool {
        self.occupant.is_some()
    }
}

/// An undirected, weighted connection.
///
/// Endpoints are stored in ascending order so that `(u, v)` and `(v, u)`
/// compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Weight,
}

impl Edge {
    /// Create a normalized edge.
    #[must_use]
    pub fn new(u: NodeId, v: NodeId, weight: Weight) -> Self {
        let (source, target) = if u <= v { (u, v) } else { (v, u) };
        Self {
            source,
            target,
            weight,
        }
    }

    /// Check if `node` is one of the endpoints.
    #[must_use]
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}
