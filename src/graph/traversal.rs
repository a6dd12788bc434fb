//! Graph traversal: shortest paths, bounded reachability, DFS orderings and
//! connectivity diagnostics.
//!
//! ## Step cost
//!
//! Moving along an edge into node `v` costs `weight(u, v) + v.cost`. Node
//! entry costs default to zero, in which case path cost is the plain sum of
//! edge weights.
//!
//! ## Determinism
//!
//! Dijkstra pops the smallest cumulative cost first and breaks ties by
//! insertion order (FIFO). Neighbours are expanded in ascending `NodeId`
//! order, so equal-cost paths always resolve the same way for a given graph.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::node::{Cost, Weight};
use super::node_graph::NodeGraph;
use crate::core::NodeId;
use crate::error::{EngineError, Result};

/// A path between two nodes with its total cost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Nodes from source to destination, inclusive.
    pub nodes: Vec<NodeId>,
    /// Sum of step costs along the path.
    pub cost: Cost,
}

impl Path {
    /// Number of edges traversed.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Nodes reachable within a budget, with their cheapest cost.
pub type ReachableSet = BTreeMap<NodeId, Cost>;

/// Dijkstra search state.
struct Search {
    dist: FxHashMap<NodeId, Cost>,
    prev: FxHashMap<NodeId, NodeId>,
}

impl NodeGraph {
    fn step_cost(&self, to: NodeId, weight: Weight) -> Cost {
        let entry = self.node(to).map_or(0, |n| n.cost);
        Cost::from(weight) + Cost::from(entry)
    }

    /// Core Dijkstra. Stops expanding past `budget` and never enters nodes
    /// rejected by `passable` (the source is always allowed). When `target`
    /// is given, stops as soon as it is settled.
    fn dijkstra<F>(&self, source: NodeId, budget: Cost, target: Option<NodeId>, passable: F) -> Search
    where
        F: Fn(NodeId) -> bool,
    {
        let mut dist: FxHashMap<NodeId, Cost> = FxHashMap::default();
        let mut prev: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut queue: BinaryHeap<Reverse<(Cost, u64, NodeId)>> = BinaryHeap::new();
        let mut seq = 0u64;

        dist.insert(source, 0);
        queue.push(Reverse((0, seq, source)));

        while let Some(Reverse((cost, _, node))) = queue.pop() {
            // Stale entry
            if cost > dist.get(&node).copied().unwrap_or(Cost::MAX) {
                continue;
            }
            if target == Some(node) {
                break;
            }

            for (next, weight) in self.neighbours(node) {
                if !passable(next) {
                    continue;
                }
                let new_cost = cost.saturating_add(self.step_cost(next, weight));
                if new_cost > budget {
                    continue;
                }
                let best = dist.get(&next).copied().unwrap_or(Cost::MAX);
                if new_cost < best {
                    dist.insert(next, new_cost);
                    prev.insert(next, node);
                    seq += 1;
                    queue.push(Reverse((new_cost, seq, next)));
                }
            }
        }

        Search { dist, prev }
    }

    /// Cheapest path from `source` to `destination`.
    ///
    /// Fails with `NodeNotFound` for unknown endpoints and `Unreachable` if
    /// the two are not connected.
    pub fn shortest_path(&self, source: NodeId, destination: NodeId) -> Result<Path> {
        self.shortest_path_where(source, destination, |_| true)
    }

    /// Cheapest path that only enters nodes accepted by `passable`.
    ///
    /// The destination itself must also be passable.
    pub fn shortest_path_where<F>(&self, source: NodeId, destination: NodeId, passable: F) -> Result<Path>
    where
        F: Fn(NodeId) -> bool,
    {
        self.require_node(source)?;
        self.require_node(destination)?;

        let search = self.dijkstra(source, Cost::MAX, Some(destination), passable);
        let cost = search.dist.get(&destination).copied().ok_or(EngineError::Unreachable {
            from: source,
            to: destination,
        })?;

        let mut nodes = vec![destination];
        let mut current = destination;
        while let Some(&p) = search.prev.get(&current) {
            nodes.push(p);
            current = p;
        }
        nodes.reverse();

        Ok(Path { nodes, cost })
    }

    /// All nodes reachable from `source` with cumulative cost ≤ `budget`,
    /// including `source` itself at cost 0.
    pub fn reachable_set(&self, source: NodeId, budget: Cost) -> Result<ReachableSet> {
        self.reachable_set_where(source, budget, |_| true)
    }

    /// Bounded reachability that only enters nodes accepted by `passable`.
    pub fn reachable_set_where<F>(&self, source: NodeId, budget: Cost, passable: F) -> Result<ReachableSet>
    where
        F: Fn(NodeId) -> bool,
    {
        self.require_node(source)?;
        Ok(self.dijkstra(source, budget, None, passable).dist.into_iter().collect())
    }

    /// Unweighted hop distance (BFS), ignoring node costs.
    ///
    /// Returns `None` if the nodes are not connected or either is missing.
    #[must_use]
    pub fn hop_distance(&self, source: NodeId, destination: NodeId) -> Option<u32> {
        if !self.contains(source) || !self.contains(destination) {
            return None;
        }
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut queue = VecDeque::from([(source, 0u32)]);
        seen.insert(source);

        while let Some((node, hops)) = queue.pop_front() {
            if node == destination {
                return Some(hops);
            }
            for (next, _) in self.neighbours(node) {
                if seen.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        None
    }

    /// Depth-first search from `sources`, returning nodes in finishing
    /// (post-) order.
    ///
    /// Sources are visited in the given order and neighbours in id order.
    /// With `include_sources == false` the sources themselves are omitted.
    pub fn depth_first_search(&self, sources: &[NodeId], include_sources: bool) -> Result<Vec<NodeId>> {
        for &s in sources {
            self.require_node(s)?;
        }

        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut order = Vec::with_capacity(self.node_count());

        for &source in sources {
            if !visited.insert(source) {
                continue;
            }
            // Each frame is a node entered but not finished, with the
            // neighbours it has yet to try.
            let mut stack: Vec<(NodeId, std::vec::IntoIter<NodeId>)> =
                vec![(source, self.neighbour_ids(source))];
            while let Some((node, pending)) = stack.last_mut() {
                let node = *node;
                match pending.find(|n| !visited.contains(n)) {
                    Some(next) => {
                        visited.insert(next);
                        stack.push((next, self.neighbour_ids(next)));
                    }
                    None => {
                        order.push(node);
                        stack.pop();
                    }
                }
            }
        }

        if !include_sources {
            order.retain(|n| !sources.contains(n));
        }
        Ok(order)
    }

    fn neighbour_ids(&self, node: NodeId) -> std::vec::IntoIter<NodeId> {
        self.neighbours(node).map(|(n, _)| n).collect::<Vec<_>>().into_iter()
    }

    /// Reverse DFS finishing order from `sources`.
    ///
    /// On an undirected graph this is a spanning order in which every node
    /// appears after the source that discovered it; it is used by map
    /// authoring tools to lay out and audit boards.
    pub fn topological_sort(&self, sources: &[NodeId], include_sources: bool) -> Result<Vec<NodeId>> {
        let mut order = self.depth_first_search(sources, include_sources)?;
        order.reverse();
        Ok(order)
    }

    /// Connected components, each sorted, ordered by smallest member.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut components = Vec::new();

        for start in self.node_ids() {
            if seen.contains(&start) {
                continue;
            }
            // Safe: start exists.
            let mut members = self.depth_first_search(&[start], true).unwrap_or_default();
            seen.extend(members.iter().copied());
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    /// Whether every node can reach every other node. An empty graph counts
    /// as connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// Whether the graph contains a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        // A forest has exactly V - C edges.
        self.edge_count() + self.connected_components().len() > self.node_count()
    }

    fn require_node(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EngineError::NodeNotFound { node: id })
        }
    }
}
