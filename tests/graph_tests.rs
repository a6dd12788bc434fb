//! Map authoring: building, editing, diagnosing and loading topologies.

mod common;

use common::{init_tracing, line_graph};
use nodewar::{
    BoardTemplate, EngineError, GameConfig, GraphData, Node, NodeGraph, NodeId, PlayerId,
    TemplateRegistry, UnitId,
};

/// Diamond with a cheap and an expensive side:
///
/// ```text
///     2
///  1 / \ 1
///   1   4
///  3 \ / 3
///     3
/// ```
fn diamond() -> NodeGraph {
    let mut graph = NodeGraph::new();
    for i in 1..=4 {
        graph.add_node(Node::new(NodeId(i))).unwrap();
    }
    graph.add_edge(NodeId(1), NodeId(2), 1).unwrap();
    graph.add_edge(NodeId(2), NodeId(4), 1).unwrap();
    graph.add_edge(NodeId(1), NodeId(3), 3).unwrap();
    graph.add_edge(NodeId(3), NodeId(4), 3).unwrap();
    graph
}

#[test]
fn test_edit_and_requery() {
    init_tracing();
    let mut graph = diamond();
    let path = graph.shortest_path(NodeId(1), NodeId(4)).unwrap();
    assert_eq!(path.nodes, vec![NodeId(1), NodeId(2), NodeId(4)]);
    assert_eq!(path.cost, 2);

    // Making the cheap side expensive flips the route.
    graph.set_edge_weight(NodeId(2), NodeId(4), 10).unwrap();
    let path = graph.shortest_path(NodeId(1), NodeId(4)).unwrap();
    assert_eq!(path.nodes, vec![NodeId(1), NodeId(3), NodeId(4)]);
    assert_eq!(path.cost, 6);

    // Dropping node 3 leaves only the expensive route.
    graph.remove_node(NodeId(3)).unwrap();
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.degree(NodeId(1)).unwrap(), 1);
    assert_eq!(graph.shortest_path(NodeId(1), NodeId(4)).unwrap().cost, 11);

    // Removing the last bridge disconnects the map.
    assert!(graph.remove_edge(NodeId(2), NodeId(4)).unwrap());
    assert!(!graph.is_connected());
    assert!(matches!(
        graph.shortest_path(NodeId(1), NodeId(4)),
        Err(EngineError::Unreachable { .. })
    ));
}

#[test]
fn test_reachable_set_matches_shortest_paths() {
    let graph = diamond();
    let reachable = graph.reachable_set(NodeId(1), 3).unwrap();
    for (&node, &cost) in &reachable {
        assert_eq!(graph.shortest_path(NodeId(1), node).unwrap().cost, cost);
        assert!(cost <= 3);
    }
    assert_eq!(
        reachable.keys().copied().collect::<Vec<_>>(),
        vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]
    );
    assert_eq!(reachable[&NodeId(3)], 3);
}

#[test]
fn test_traversals_cover_component() {
    let graph = line_graph(5);
    let order = graph.depth_first_search(&[NodeId(3)], true).unwrap();
    assert_eq!(order.len(), 5);

    let sorted = graph.topological_sort(&[NodeId(1)], true).unwrap();
    assert_eq!(sorted.first(), Some(&NodeId(1)));
    assert_eq!(sorted.len(), 5);
    assert!(!graph.has_cycle());
    assert!(diamond().has_cycle());
}

#[test]
fn test_json_map_roundtrip() {
    let json = r#"{
        "nodes": [{"id": 1}, {"id": 2, "cost": 2}, {"id": 3}],
        "links": [
            {"source": 1, "target": 2, "weight": 1},
            {"source": 3, "target": 2, "weight": 4}
        ]
    }"#;
    let data: GraphData = serde_json::from_str(json).unwrap();
    let graph = NodeGraph::deserialize(data).unwrap();

    assert_eq!(graph.node(NodeId(2)).unwrap().cost, 2);
    assert_eq!(graph.edge_weight(NodeId(2), NodeId(3)), Some(4));
    assert!(graph.has_adjacent(NodeId(3), NodeId(2)));
    // 1 -> 2 pays the edge plus the node's entry cost.
    assert_eq!(graph.shortest_path(NodeId(1), NodeId(2)).unwrap().cost, 3);

    let again: NodeGraph = serde_json::from_str(&serde_json::to_string(&graph).unwrap()).unwrap();
    assert_eq!(again, graph);
}

#[test]
fn test_registry_loads_authored_maps() {
    init_tracing();
    let json = r#"[{
        "variant": "bridge",
        "nodes": [{"id": 1}, {"id": 2}, {"id": 3}],
        "links": [
            {"source": 1, "target": 2, "weight": 1},
            {"source": 2, "target": 3, "weight": 1}
        ],
        "seats": [
            [{"name": "Guard", "power": 3, "node": 1}],
            [{"name": "Guard", "power": 3, "node": 3, "movement": 1}]
        ]
    }]"#;
    let mut registry = TemplateRegistry::with_builtins();
    assert_eq!(registry.load_json(json).unwrap(), 1);
    assert!(registry.variants().contains(&"bridge"));

    let template = registry.resolve("bridge").unwrap();
    let board = template
        .build(&[PlayerId(1), PlayerId(2)], &GameConfig::default())
        .unwrap();
    assert_eq!(board.variant(), "bridge");
    assert_eq!(board.units().count(), 2);
    assert_eq!(board.unit_at(NodeId(3)).unwrap().movement, 1);
    assert_eq!(board.unit_at(NodeId(1)).unwrap().movement, GameConfig::default().default_movement);
}

#[test]
fn test_registry_rejects_disconnected_map() {
    let json = r#"[{
        "variant": "islands",
        "nodes": [{"id": 1}, {"id": 2}],
        "links": [],
        "seats": [[{"name": "A", "power": 1, "node": 1}], [{"name": "B", "power": 1, "node": 2}]]
    }]"#;
    let mut registry = TemplateRegistry::new();
    assert!(matches!(
        registry.load_json(json),
        Err(EngineError::InvalidTemplate { .. })
    ));
    assert!(registry.variants().is_empty());
}

#[test]
fn test_authored_occupants_are_rejected() {
    let json = r#"[{
        "variant": "squatter",
        "nodes": [{"id": 1}, {"id": 2, "occupant": 1}, {"id": 3}],
        "links": [
            {"source": 1, "target": 2, "weight": 1},
            {"source": 2, "target": 3, "weight": 1}
        ],
        "seats": [[{"name": "A", "power": 3, "node": 1}], [{"name": "B", "power": 3, "node": 3}]]
    }]"#;
    let mut registry = TemplateRegistry::new();
    assert!(matches!(
        registry.load_json(json),
        Err(EngineError::InvalidTemplate { .. })
    ));

    // Map editing on a live board cannot smuggle one in either.
    let mut board = BoardTemplate::line()
        .build(&[PlayerId(1), PlayerId(2)], &GameConfig::default())
        .unwrap();
    let mut node = Node::new(NodeId(7));
    node.occupant = Some(UnitId(1));
    assert!(matches!(
        board.graph_mut().add_node(node),
        Err(EngineError::OccupiedNode { .. })
    ));
    board.graph_mut().add_node(Node::new(NodeId(7))).unwrap();
    board.validate().unwrap();
}

#[test]
fn test_scatter_maps_are_playable_and_deterministic() {
    let registry = TemplateRegistry::with_builtins();
    for seed in 0..25u64 {
        let variant = format!("scatter:{seed}");
        let template = registry.resolve(&variant).unwrap();
        template.validate().unwrap();
        assert_eq!(template, BoardTemplate::scatter(seed));
        assert!(template.graph().unwrap().is_connected());
    }
    assert!(matches!(
        registry.resolve("scatter:abc"),
        Err(EngineError::UnknownVariant { .. })
    ));
}
