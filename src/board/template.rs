//! Board templates: named topologies with per-seat deployments.
//!
//! A `BoardTemplate` is plain data (serde) describing nodes, links and the
//! units each seat starts with. `build` turns it into a fresh `Board` for an
//! ordered player list, assigning seat `i` to `players[i]`.
//!
//! `TemplateRegistry` maps variant names to templates. It ships with built-in
//! variants and accepts host-authored ones from JSON. Registration validates
//! the map: the graph must be well formed and fully connected, and every
//! deployment must name a distinct existing node.
//!
//! ## Built-in variants
//!
//! | Variant          | Topology                           | Seats |
//! |------------------|------------------------------------|-------|
//! | `line`           | 6 nodes in a row                   | 2     |
//! | `ring`           | 8-node cycle                       | 2     |
//! | `grid`           | 4x4 lattice                        | 4     |
//! | `skirmish`       | 7 nodes, mixed weights and terrain | 2     |
//! | `scatter:<seed>` | 12 nodes generated from `seed`     | 2     |

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::board::Board;
use super::unit::Unit;
use crate::core::{GameConfig, GameRng, NodeId, PlayerId, UnitId};
use crate::error::{EngineError, Result};
use crate::graph::{Edge, GraphData, Node, NodeGraph, Weight};

/// Prefix of generated variants.
pub const SCATTER_PREFIX: &str = "scatter:";

/// One unit a seat starts with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    pub power: u32,
    /// Falls back to `GameConfig::default_movement`.
    #[serde(default)]
    pub movement: Option<u32>,
    pub node: NodeId,
}

impl UnitSpec {
    /// Create a spec using the configured default movement.
    pub fn new(name: impl Into<String>, power: u32, node: NodeId) -> Self {
        Self {
            name: name.into(),
            power,
            movement: None,
            node,
        }
    }

    /// Set an explicit movement budget.
    #[must_use]
    pub fn with_movement(mut self, movement: u32) -> Self {
        self.movement = Some(movement);
        self
    }
}

/// A named topology with seat deployments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTemplate {
    pub variant: String,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Edge>,
    /// Starting units, one list per seat.
    pub seats: Vec<Vec<UnitSpec>>,
}

impl BoardTemplate {
    /// Number of seats (maximum players).
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    fn invalid(&self, reason: impl Into<String>) -> EngineError {
        EngineError::InvalidTemplate {
            variant: self.variant.clone(),
            reason: reason.into(),
        }
    }

    /// Build the topology alone.
    pub fn graph(&self) -> Result<NodeGraph> {
        NodeGraph::deserialize(GraphData {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
        })
        .map_err(|e| self.invalid(e.to_string()))
    }

    /// Check the template is playable.
    pub fn validate(&self) -> Result<()> {
        let graph = self.graph()?;
        if graph.node_count() == 0 {
            return Err(self.invalid("no nodes"));
        }
        if !graph.is_connected() {
            let parts = graph.connected_components().len();
            return Err(self.invalid(format!("topology has {parts} disconnected parts")));
        }
        if let Some(node) = self.nodes.iter().find(|n| n.has_unit()) {
            return Err(self.invalid(format!("{} is pre-occupied", node.id)));
        }
        if self.seats.is_empty() {
            return Err(self.invalid("no seats"));
        }

        let mut used: FxHashSet<NodeId> = FxHashSet::default();
        for (seat, specs) in self.seats.iter().enumerate() {
            if specs.is_empty() {
                return Err(self.invalid(format!("seat {seat} has no units")));
            }
            for spec in specs {
                if !graph.contains(spec.node) {
                    return Err(self.invalid(format!("seat {seat} deploys on missing {}", spec.node)));
                }
                if !used.insert(spec.node) {
                    return Err(self.invalid(format!("{} is deployed twice", spec.node)));
                }
            }
        }
        Ok(())
    }

    /// Build a board for `players`, seat `i` going to `players[i]`.
    ///
    /// Unit ids are assigned sequentially from 1 in seat order.
    pub fn build(&self, players: &[PlayerId], config: &GameConfig) -> Result<Board> {
        if players.len() > self.seat_count() {
            return Err(EngineError::GameFull {
                seats: self.seat_count(),
            });
        }

        let mut board = Board::new(self.variant.clone(), self.graph()?)
            .with_pass_through_allies(config.pass_through_allies);
        let mut next_id = 1u32;

        for (&player, specs) in players.iter().zip(&self.seats) {
            for spec in specs {
                let unit = Unit::new(UnitId(next_id), spec.name.clone(), player)
                    .with_power(spec.power)
                    .with_movement(spec.movement.unwrap_or(config.default_movement));
                board.add_unit(unit, spec.node)?;
                next_id += 1;
            }
        }

        board.validate().map_err(|e| self.invalid(e.to_string()))?;
        debug!(variant = %self.variant, players = players.len(), units = next_id - 1, "Built board");
        Ok(board)
    }

    // === Built-in variants ===

    /// Six nodes in a row; each seat holds one end.
    #[must_use]
    pub fn line() -> Self {
        let nodes = (1..=6).map(|i| Node::new(NodeId(i))).collect();
        let links = (1..6).map(|i| Edge::new(NodeId(i), NodeId(i + 1), 1)).collect();
        Self {
            variant: "line".to_string(),
            nodes,
            links,
            seats: vec![
                vec![
                    UnitSpec::new("Vanguard", 5, NodeId(1)),
                    UnitSpec::new("Scout", 2, NodeId(2)).with_movement(3),
                ],
                vec![
                    UnitSpec::new("Vanguard", 5, NodeId(6)),
                    UnitSpec::new("Scout", 2, NodeId(5)).with_movement(3),
                ],
            ],
        }
    }

    /// Eight-node cycle; seats start opposite each other.
    #[must_use]
    pub fn ring() -> Self {
        let nodes = (1..=8).map(|i| Node::new(NodeId(i))).collect();
        let links = (1..=8)
            .map(|i| Edge::new(NodeId(i), NodeId(i % 8 + 1), 1))
            .collect();
        Self {
            variant: "ring".to_string(),
            nodes,
            links,
            seats: vec![
                vec![UnitSpec::new("Warden", 4, NodeId(1))],
                vec![UnitSpec::new("Warden", 4, NodeId(5))],
            ],
        }
    }

    /// 4x4 lattice, ids `row * 4 + col + 1`; one seat per corner.
    #[must_use]
    pub fn grid() -> Self {
        const SIDE: u32 = 4;
        let id = |row: u32, col: u32| NodeId(row * SIDE + col + 1);

        let nodes = (0..SIDE * SIDE).map(|i| Node::new(NodeId(i + 1))).collect();
        let mut links = Vec::new();
        for row in 0..SIDE {
            for col in 0..SIDE {
                if col + 1 < SIDE {
                    links.push(Edge::new(id(row, col), id(row, col + 1), 1));
                }
                if row + 1 < SIDE {
                    links.push(Edge::new(id(row, col), id(row + 1, col), 1));
                }
            }
        }

        let corner = |a: NodeId, b: NodeId| {
            vec![UnitSpec::new("Knight", 4, a), UnitSpec::new("Pikeman", 3, b)]
        };
        Self {
            variant: "grid".to_string(),
            nodes,
            links,
            seats: vec![
                corner(id(0, 0), id(0, 1)),
                corner(id(3, 3), id(3, 2)),
                corner(id(0, 3), id(1, 3)),
                corner(id(3, 0), id(2, 0)),
            ],
        }
    }

    /// Hand-authored map with a costly marsh and a fast road.
    ///
    /// ```text
    ///   1 --1-- 2 --1-- 3
    ///   |       |       |
    ///   2     (4:marsh) 2
    ///   |       |       |
    ///   5 --3-- 6 --3-- 7     (4 joins 2 and 6, entry cost 2)
    /// ```
    #[must_use]
    pub fn skirmish() -> Self {
        let nodes = vec![
            Node::new(NodeId(1)),
            Node::new(NodeId(2)),
            Node::new(NodeId(3)),
            Node::new(NodeId(4)).with_cost(2),
            Node::new(NodeId(5)),
            Node::new(NodeId(6)),
            Node::new(NodeId(7)),
        ];
        let links = vec![
            Edge::new(NodeId(1), NodeId(2), 1),
            Edge::new(NodeId(2), NodeId(3), 1),
            Edge::new(NodeId(1), NodeId(5), 2),
            Edge::new(NodeId(3), NodeId(7), 2),
            Edge::new(NodeId(2), NodeId(4), 1),
            Edge::new(NodeId(4), NodeId(6), 1),
            Edge::new(NodeId(5), NodeId(6), 3),
            Edge::new(NodeId(6), NodeId(7), 3),
        ];
        Self {
            variant: "skirmish".to_string(),
            nodes,
            links,
            seats: vec![
                vec![
                    UnitSpec::new("Captain", 6, NodeId(1)),
                    UnitSpec::new("Archer", 2, NodeId(5)).with_movement(3),
                ],
                vec![
                    UnitSpec::new("Captain", 6, NodeId(7)),
                    UnitSpec::new("Archer", 2, NodeId(3)).with_movement(3),
                ],
            ],
        }
    }

    /// Generate a connected 12-node map from `seed`.
    ///
    /// A random spanning tree guarantees connectivity; a few extra links add
    /// cycles. Seats deploy on the two ends of the tree's node order.
    #[must_use]
    pub fn scatter(seed: u64) -> Self {
        const NODES: u32 = 12;
        let rng = GameRng::new(seed);
        let mut topo = rng.for_context("topology");
        let mut terrain = rng.for_context("terrain");

        let mut order: Vec<u32> = (1..=NODES).collect();
        topo.shuffle(&mut order);

        let nodes = order
            .iter()
            .map(|&i| {
                let cost = if terrain.gen_bool(0.2) { terrain.gen_range_u32(1..3) } else { 0 };
                Node::new(NodeId(i)).with_cost(cost)
            })
            .collect();

        let mut seen: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();
        let mut links = Vec::new();
        let mut push = |links: &mut Vec<Edge>, u: NodeId, v: NodeId, w: Weight| {
            let e = Edge::new(u, v, w);
            if u != v && seen.insert((e.source, e.target)) {
                links.push(e);
            }
        };

        for i in 1..order.len() {
            let parent = order[topo.gen_range_usize(0..i)];
            let weight = topo.gen_range_u32(1..4);
            push(&mut links, NodeId(order[i]), NodeId(parent), weight);
        }
        for _ in 0..NODES / 3 {
            let u = order[topo.gen_range_usize(0..order.len())];
            let v = order[topo.gen_range_usize(0..order.len())];
            let weight = topo.gen_range_u32(1..4);
            push(&mut links, NodeId(u), NodeId(v), weight);
        }

        let first = NodeId(order[0]);
        let last = NodeId(order[order.len() - 1]);
        Self {
            variant: format!("{SCATTER_PREFIX}{seed}"),
            nodes,
            links,
            seats: vec![
                vec![UnitSpec::new("Raider", 4, first).with_movement(4)],
                vec![UnitSpec::new("Raider", 4, last).with_movement(4)],
            ],
        }
    }
}

/// Named board templates.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    templates: FxHashMap<String, BoardTemplate>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in variants.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for template in [
            BoardTemplate::line(),
            BoardTemplate::ring(),
            BoardTemplate::grid(),
            BoardTemplate::skirmish(),
        ] {
            registry.templates.insert(template.variant.clone(), template);
        }
        registry
    }

    /// Register a template after validating it. Replaces any template with
    /// the same variant name.
    pub fn register(&mut self, template: BoardTemplate) -> Result<()> {
        template.validate()?;
        debug!(variant = %template.variant, "Registered board template");
        self.templates.insert(template.variant.clone(), template);
        Ok(())
    }

    /// Register templates from a JSON array.
    ///
    /// Returns the number of templates added. Nothing is registered if any
    /// template fails to parse or validate.
    pub fn load_json(&mut self, json: &str) -> Result<usize> {
        let templates: Vec<BoardTemplate> =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidTemplate {
                variant: "<json>".to_string(),
                reason: e.to_string(),
            })?;
        for template in &templates {
            template.validate()?;
        }
        let count = templates.len();
        for template in templates {
            self.templates.insert(template.variant.clone(), template);
        }
        Ok(count)
    }

    /// Resolve a variant name, generating `scatter:<seed>` maps on demand.
    pub fn resolve(&self, variant: &str) -> Result<BoardTemplate> {
        if let Some(template) = self.templates.get(variant) {
            return Ok(template.clone());
        }
        if let Some(seed) = variant.strip_prefix(SCATTER_PREFIX) {
            let seed: u64 = seed.parse().map_err(|_| EngineError::UnknownVariant {
                variant: variant.to_string(),
            })?;
            let template = BoardTemplate::scatter(seed);
            template.validate()?;
            return Ok(template);
        }
        Err(EngineError::UnknownVariant {
            variant: variant.to_string(),
        })
    }

    /// Registered variant names, sorted.
    #[must_use]
    pub fn variants(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
