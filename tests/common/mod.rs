//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Once;

use nodewar::{Board, Node, NodeGraph, NodeId, PlayerId, Unit, UnitId};

static TRACING: Once = Once::new();

/// Install a test subscriber once per binary. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Nodes `1..=len` in a row, every edge weight 1.
pub fn line_graph(len: u32) -> NodeGraph {
    let mut graph = NodeGraph::new();
    for i in 1..=len {
        graph.add_node(Node::new(NodeId(i))).unwrap();
    }
    for i in 1..len {
        graph.add_edge(NodeId(i), NodeId(i + 1), 1).unwrap();
    }
    graph
}

/// An empty board over `line_graph(len)`.
pub fn line_board(len: u32) -> Board {
    Board::new("test-line", line_graph(len))
}

pub fn unit(id: u32, owner: u64, power: u32, movement: u32) -> Unit {
    Unit::new(UnitId(id), format!("U{id}"), PlayerId(owner))
        .with_power(power)
        .with_movement(movement)
}
