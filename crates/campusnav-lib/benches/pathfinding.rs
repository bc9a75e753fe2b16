use criterion::{criterion_group, criterion_main, Criterion};
use campusnav_lib::{
    auto_connect, destination_point, route, route_to_nearest_evacuation, CampusGraph, Coordinates,
    Node, NodeType,
};
use once_cell::sync::Lazy;
use std::hint::black_box;

const GRID_SIZE: usize = 30;
const SPACING_M: f64 = 25.0;
const ORIGIN: Coordinates = Coordinates {
    latitude: 34.0689,
    longitude: -118.4452,
};

/// Square walkway grid with evacuation points on the far edge.
static CAMPUS: Lazy<CampusGraph> = Lazy::new(|| {
    let mut graph = CampusGraph::new();
    for row in 0..GRID_SIZE {
        let row_origin = destination_point(ORIGIN, SPACING_M * row as f64, 0.0);
        for col in 0..GRID_SIZE {
            let node_type = if row == GRID_SIZE - 1 && col % 10 == 0 {
                NodeType::Evacuation
            } else {
                NodeType::Path
            };
            let id = format!("n{row:02}_{col:02}");
            let position = destination_point(row_origin, SPACING_M * col as f64, 90.0);
            graph.upsert_node(Node::new(id.clone(), id, node_type, Some(position)));
        }
    }
    auto_connect(&mut graph, SPACING_M * 1.5);
    graph
});

fn benchmark_pathfinding(c: &mut Criterion) {
    let campus = &*CAMPUS;
    let goal = format!("n{:02}_{:02}", GRID_SIZE - 1, GRID_SIZE - 1);

    c.bench_function("a_star_corner_to_corner", |b| {
        b.iter(|| {
            let plan = route(campus, ORIGIN, &goal).expect("route exists");
            black_box(plan.hop_count())
        });
    });

    c.bench_function("dijkstra_nearest_evacuation", |b| {
        b.iter(|| {
            let plan = route_to_nearest_evacuation(campus, ORIGIN).expect("route exists");
            black_box(plan.total_distance_meters)
        });
    });

    c.bench_function("auto_connect_grid", |b| {
        b.iter(|| {
            let mut graph = campus.clone();
            graph.clear_connections();
            black_box(auto_connect(&mut graph, SPACING_M * 1.5))
        });
    });
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
