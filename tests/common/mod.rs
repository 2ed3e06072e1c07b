// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use fogwalk::config::Config;
use fogwalk::db::JsonStore;
use fogwalk::geometry::{GeoPoint, Polygon};
use fogwalk::models::{District, DistrictSource, OsmPayload};
use fogwalk::routes::create_router;
use fogwalk::services::{Notifier, OverpassClient, Session};
use fogwalk::AppState;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Sample boundary payload covering relations, ways and nodes.
#[allow(dead_code)]
pub fn sample_payload() -> OsmPayload {
    let raw = std::fs::read_to_string("tests/fixtures/overpass_sample.json")
        .expect("Failed to read fixture - is tests/fixtures/ committed?");
    OsmPayload::parse(&raw).expect("Fixture should parse")
}

/// Axis-aligned square district centered on (lat, lng).
#[allow(dead_code)]
pub fn square_district(id: i64, name: &str, lat: f64, lng: f64, half: f64) -> District {
    let ring = Polygon::new(vec![
        GeoPoint::new(lat - half, lng - half),
        GeoPoint::new(lat - half, lng + half),
        GeoPoint::new(lat + half, lng + half),
        GeoPoint::new(lat + half, lng - half),
    ])
    .expect("square has four vertices");
    District::new(id, name.to_string(), vec![ring], None, DistrictSource::Way)
        .expect("square yields a district")
}

/// Create a test app with an in-memory store and auto-fetch disabled.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_store(JsonStore::in_memory())
}

#[allow(dead_code)]
pub fn create_test_app_with_store(store: JsonStore) -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let notifier = Notifier::default();
    let session = Session::load(&config, store, notifier.clone());
    // Never contacted: auto-fetch is off in the test config.
    let overpass = OverpassClient::new("http://127.0.0.1:9/api/interpreter");

    let state = Arc::new(AppState {
        config,
        session: Mutex::new(session),
        overpass,
        notifier,
    });

    (create_router(state.clone()), state)
}
