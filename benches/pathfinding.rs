//! Movement queries on built-in and generated maps.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nodewar::{BoardTemplate, NodeId};

fn bench_shortest_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("shortest_path");
    for template in [BoardTemplate::grid(), BoardTemplate::skirmish(), BoardTemplate::scatter(7)] {
        let graph = template.graph().expect("built-in template is valid");
        let ids: Vec<NodeId> = graph.node_ids().collect();
        let (first, last) = (ids[0], ids[ids.len() - 1]);
        group.bench_with_input(BenchmarkId::from_parameter(&template.variant), &graph, |b, g| {
            b.iter(|| g.shortest_path(black_box(first), black_box(last)))
        });
    }
    group.finish();
}

fn bench_reachable_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("reachable_set");
    let graph = BoardTemplate::grid().graph().expect("built-in template is valid");
    for budget in [1u64, 3, 6] {
        group.bench_with_input(BenchmarkId::from_parameter(budget), &budget, |b, &budget| {
            b.iter(|| graph.reachable_set(black_box(NodeId(1)), budget))
        });
    }
    group.finish();
}

fn bench_board_move_options(c: &mut Criterion) {
    let template = BoardTemplate::grid();
    let players: Vec<_> = (1..=4).map(nodewar::PlayerId).collect();
    let board = template
        .build(&players, &nodewar::GameConfig::default())
        .expect("built-in template is valid");
    c.bench_function("move_options/grid", |b| {
        b.iter(|| board.move_options(black_box(nodewar::UnitId(1))))
    });
}

criterion_group!(benches, bench_shortest_path, bench_reachable_set, bench_board_move_options);
criterion_main!(benches);
