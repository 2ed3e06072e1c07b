use criterion::{criterion_group, criterion_main, Criterion};
use fogwalk::geometry::{Bounds, GeoPoint, SpatialGrid};
use fogwalk::models::OsmPayload;
use fogwalk::services::{normalize, UnlockEngine};
use serde_json::json;
use std::hint::black_box;

/// A 20x20 lattice of named place nodes, jittered so no three are collinear.
fn synthetic_payload() -> OsmPayload {
    let mut elements = Vec::new();
    for row in 0..20 {
        for col in 0..20 {
            let id = row * 20 + col;
            let jitter = ((id * 7919) % 13) as f64 * 0.0003;
            elements.push(json!({
                "type": "node",
                "id": id,
                "lat": 37.0 + row as f64 * 0.01 + jitter,
                "lon": -122.0 + col as f64 * 0.01 - jitter,
                "tags": { "place": "neighbourhood", "name": format!("Cell {}", id) }
            }));
        }
    }
    OsmPayload::from_value(json!({ "elements": elements })).expect("synthetic payload")
}

fn benchmark_containment(c: &mut Criterion) {
    // Node-only payload, so every district is a clipped Voronoi cell.
    let districts = normalize(&synthetic_payload());
    let engine = UnlockEngine::default();

    let inside = GeoPoint::new(37.105, -121.905);
    let far_away = GeoPoint::new(40.0, -115.0);

    let mut group = c.benchmark_group("containment");

    group.bench_function("point_inside_set", |b| {
        b.iter(|| engine.containing(black_box(&inside), &districts).len())
    });

    group.bench_function("point_far_away", |b| {
        b.iter(|| engine.containing(black_box(&far_away), &districts).len())
    });

    group.bench_function("normalize_400_nodes", |b| {
        let payload = synthetic_payload();
        b.iter(|| normalize(black_box(&payload)).len())
    });

    group.finish();
}

fn benchmark_trail_window(c: &mut Criterion) {
    // A long wandering trail of ~10 m steps.
    let trail: Vec<GeoPoint> = (0..50_000)
        .map(|i| {
            let i = i as f64;
            GeoPoint::new(37.0 + (i * 0.00009) % 0.2, -122.0 + (i * 0.000_013) % 0.2)
        })
        .collect();
    let grid = SpatialGrid::from_points(0.005, &trail);
    let window = Bounds::new(37.05, -121.95, 37.07, -121.93);

    c.bench_function("trail_window_query", |b| {
        b.iter(|| grid.query(black_box(&window)).len())
    });
}

criterion_group!(benches, benchmark_containment, benchmark_trail_window);
criterion_main!(benches);
