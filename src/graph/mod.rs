//! Topology: nodes, weighted undirected edges, and traversal algorithms.
//!
//! The graph is a flat collection of nodes indexed by `NodeId` plus an
//! adjacency map from each id to `(neighbour, weight)` pairs. No node owns or
//! points at another, so there are no reference cycles to manage.
//!
//! - `NodeGraph`: mutation (`add_node`, `remove_node`, `add_edge`, ...) and
//!   queries (`adjacent`, `degree`, `edge_weight`)
//! - traversal: `shortest_path`, `reachable_set`, `hop_distance`,
//!   `depth_first_search`, `topological_sort`, connectivity checks
//! - `GraphData`: the serialized node/link form

pub mod node;
pub mod node_graph;
pub mod traversal;

pub use node::{Cost, Edge, Node, Weight};
pub use node_graph::{GraphData, Neighbours, NodeGraph};
pub use traversal::{Path, ReachableSet};
