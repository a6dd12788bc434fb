//! Weighted, undirected topology.
//!
//! `NodeGraph` owns every node and edge. Nodes are kept in an ordered map
//! keyed by `NodeId`, and adjacency is a second ordered map from each node to
//! its neighbours and edge weights. Ordered maps give every traversal a fixed
//! neighbour order, which keeps path tie-breaking deterministic.
//!
//! Both maps are `im` persistent structures, so cloning a graph for a
//! snapshot is O(1).
//!
//! ## Serialized form
//!
//! A graph serializes as `GraphData`: a node list plus a link list. Decoding
//! re-validates the structure, so a stored graph with dangling or duplicated
//! links is rejected instead of producing a broken adjacency map.

use im::OrdMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::node::{Edge, Node, Weight};
use crate::core::{NodeId, UnitId};
use crate::error::{EngineError, Result};

/// Neighbour list returned by `adjacent`. Most boards have low degree.
pub type Neighbours = SmallVec<[(NodeId, Weight); 6]>;

/// Weighted undirected graph of positions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphData", into = "GraphData")]
pub struct NodeGraph {
    nodes: OrdMap<NodeId, Node>,
    adjacency: OrdMap<NodeId, OrdMap<NodeId, Weight>>,
}

impl NodeGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Nodes ===

    /// Add an empty node.
    ///
    /// Fails with `DuplicateNode` if the id is taken, or `OccupiedNode` if the
    /// node already names an occupant. Units are placed through the board.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if let Some(occupant) = node.occupant {
            return Err(EngineError::OccupiedNode {
                node: node.id,
                occupant,
            });
        }
        self.insert_node(node)
    }

    fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(EngineError::DuplicateNode { node: node.id });
        }
        self.adjacency.insert(node.id, OrdMap::new());
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Remove a node and all incident edges.
    ///
    /// Fails with `NodeInUse` if a unit currently holds the node.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let node = self.node(id).ok_or(EngineError::NodeNotFound { node: id })?;
        if let Some(occupant) = node.occupant {
            return Err(EngineError::NodeInUse { node: id, occupant });
        }

        if let Some(neighbours) = self.adjacency.remove(&id) {
            for neighbour in neighbours.keys() {
                if let Some(back) = self.adjacency.get_mut(neighbour) {
                    back.remove(&id);
                }
            }
        }
        self.nodes
            .remove(&id)
            .ok_or(EngineError::NodeNotFound { node: id })
    }

    /// Get a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Check if a node exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterate over nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current occupant of a node.
    #[must_use]
    pub fn occupant(&self, id: NodeId) -> Option<UnitId> {
        self.nodes.get(&id).and_then(|n| n.occupant)
    }

    /// Set or clear the occupant of a node.
    pub(crate) fn set_occupant(&mut self, id: NodeId, occupant: Option<UnitId>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(EngineError::NodeNotFound { node: id })?;
        node.occupant = occupant;
        Ok(())
    }

    // === Edges ===

    /// Add an undirected edge, or update its weight if it already exists.
    ///
    /// Fails with `NodeNotFound` if either endpoint is missing.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, weight: Weight) -> Result<()> {
        self.require(u)?;
        self.require(v)?;
        if u == v {
            return Err(EngineError::InvalidConfig {
                message: format!("self-loop on {u}"),
            });
        }

        if let Some(out) = self.adjacency.get_mut(&u) {
            out.insert(v, weight);
        }
        if let Some(back) = self.adjacency.get_mut(&v) {
            back.insert(u, weight);
        }
        Ok(())
    }

    /// Remove an undirected edge.
    ///
    /// Returns whether the edge existed. Fails with `NodeNotFound` if either
    /// endpoint is missing.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> Result<bool> {
        self.require(u)?;
        self.require(v)?;

        let existed = self
            .adjacency
            .get_mut(&u)
            .and_then(|out| out.remove(&v))
            .is_some();
        if let Some(back) = self.adjacency.get_mut(&v) {
            back.remove(&u);
        }
        Ok(existed)
    }

    /// Weight of the edge between `u` and `v`, if connected.
    #[must_use]
    pub fn edge_weight(&self, u: NodeId, v: NodeId) -> Option<Weight> {
        self.adjacency.get(&u).and_then(|out| out.get(&v)).copied()
    }

    /// Change the weight of an existing edge.
    ///
    /// Fails with `Unreachable` if `u` and `v` are not directly connected.
    pub fn set_edge_weight(&mut self, u: NodeId, v: NodeId, weight: Weight) -> Result<()> {
        self.require(u)?;
        self.require(v)?;
        if self.edge_weight(u, v).is_none() {
            return Err(EngineError::Unreachable { from: u, to: v });
        }
        self.add_edge(u, v, weight)
    }

    /// Directly connected nodes and their edge weights, in id order.
    pub fn adjacent(&self, id: NodeId) -> Result<Neighbours> {
        let out = self
            .adjacency
            .get(&id)
            .ok_or(EngineError::NodeNotFound { node: id })?;
        Ok(out.iter().map(|(&n, &w)| (n, w)).collect())
    }

    /// Check whether `u` and `v` share an edge.
    #[must_use]
    pub fn has_adjacent(&self, u: NodeId, v: NodeId) -> bool {
        self.edge_weight(u, v).is_some()
    }

    /// Number of incident edges. In-degree and out-degree are equal on an
    /// undirected graph.
    pub fn degree(&self, id: NodeId) -> Result<usize> {
        self.adjacency
            .get(&id)
            .map(OrdMap::len)
            .ok_or(EngineError::NodeNotFound { node: id })
    }

    /// All edges, each reported once, sorted by endpoints.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.adjacency
            .iter()
            .flat_map(|(&u, out)| {
                out.iter()
                    .filter(move |(&v, _)| u < v)
                    .map(move |(&v, &w)| Edge::new(u, v, w))
            })
            .collect()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(OrdMap::len).sum::<usize>() / 2
    }

    /// Raw neighbour map for traversal.
    pub(crate) fn neighbours(&self, id: NodeId) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|out| out.iter().map(|(&n, &w)| (n, w)))
    }

    fn require(&self, id: NodeId) -> Result<()> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(EngineError::NodeNotFound { node: id })
        }
    }

    // === Serialization ===

    /// Export to the serialized node/link form.
    #[must_use]
    pub fn serialize(&self) -> GraphData {
        GraphData::from(self.clone())
    }

    /// Rebuild a graph from its serialized form, validating structure.
    pub fn deserialize(data: GraphData) -> Result<Self> {
        Self::try_from(data)
    }
}

/// Serialized graph: nodes plus undirected links.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Edge>,
}

impl From<NodeGraph> for GraphData {
    fn from(graph: NodeGraph) -> Self {
        Self {
            links: graph.edges(),
            nodes: graph.nodes.into_iter().map(|(_, node)| node).collect(),
        }
    }
}

impl TryFrom<GraphData> for NodeGraph {
    type Error = EngineError;

    fn try_from(data: GraphData) -> Result<Self> {
        let mut graph = NodeGraph::new();
        // Stored boards carry occupants; `Board::validate` checks them.
        for node in data.nodes {
            graph.insert_node(node)?;
        }
        for link in data.links {
            if graph.has_adjacent(link.source, link.target) {
                return Err(EngineError::InvalidConfig {
                    message: format!("duplicate link {} - {}", link.source, link.target),
                });
            }
            graph.add_edge(link.source, link.target, link.weight)?;
        }
        Ok(graph)
    }
}
