// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! District normalization against a recorded boundary payload.
//!
//! The fixture mixes a multi-way boundary relation, a closed place way, a
//! degenerate way, three named place nodes and one malformed element.

use fogwalk::geometry::GeoPoint;
use fogwalk::models::osm::UNKNOWN_DISTRICT_NAME;
use fogwalk::models::{DistrictSource, OsmPayload};
use fogwalk::services::normalize;

mod common;

#[test]
fn test_fixture_decodes_and_drops_malformed_element() {
    let payload = common::sample_payload();
    assert_eq!(payload.elements.len(), 6);
    assert_eq!(payload.dropped, 1);
}

#[test]
fn test_fixture_normalizes_in_payload_order() {
    let districts = normalize(&common::sample_payload());

    let summary: Vec<(i64, &str, DistrictSource)> = districts
        .iter()
        .map(|d| (d.id, d.name.as_str(), d.source))
        .collect();
    assert_eq!(
        summary,
        vec![
            (100, "Riverside", DistrictSource::Boundary),
            (200, "Old Town", DistrictSource::Way),
            (301, "North End", DistrictSource::Synthesized),
            (302, "Harbor", DistrictSource::Synthesized),
            (303, UNKNOWN_DISTRICT_NAME, DistrictSource::Synthesized),
        ]
    );
}

#[test]
fn test_relation_outer_ways_stitched_and_inner_ignored() {
    let districts = normalize(&common::sample_payload());
    let riverside = districts.iter().find(|d| d.id == 100).unwrap();

    assert_eq!(riverside.polygons.len(), 1);
    assert_eq!(riverside.polygons[0].len(), 4);
    assert!(riverside.contains(&GeoPoint::new(10.05, 20.05)));
    assert!(riverside.contains(&GeoPoint::new(10.02, 20.08)));
    assert!(!riverside.contains(&GeoPoint::new(10.2, 20.05)));
}

#[test]
fn test_synthesized_cells_contain_their_node() {
    let districts = normalize(&common::sample_payload());
    let nodes = [
        (301, GeoPoint::new(12.0, 22.0)),
        (302, GeoPoint::new(12.0, 22.05)),
        (303, GeoPoint::new(12.05, 22.02)),
    ];
    for (id, position) in nodes {
        let district = districts.iter().find(|d| d.id == id).unwrap();
        assert!(district.contains(&position), "district {} misses its node", id);
        for (other_id, _) in nodes.iter().filter(|(o, _)| *o != id) {
            let other = districts.iter().find(|d| d.id == *other_id).unwrap();
            assert!(!other.contains(&position));
        }
    }
}

#[test]
fn test_relation_with_disjoint_outer_ways() {
    // Two outer ways that do not touch: each is kept as its own ring.
    // An empty role counts as outer.
    let payload = OsmPayload::parse(
        r#"[{"type": "relation", "id": 9, "tags": {"name": "Split"}, "members": [
            {"type": "way", "ref": 1, "role": "outer", "geometry": [
                {"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 1.0}, {"lat": 1.0, "lon": 1.0}]},
            {"type": "way", "ref": 2, "role": "", "geometry": [
                {"lat": 5.0, "lon": 5.0}, {"lat": 5.0, "lon": 6.0}, {"lat": 6.0, "lon": 6.0}]}
        ]}]"#,
    )
    .unwrap();
    let districts = normalize(&payload);
    assert_eq!(districts.len(), 1);
    assert_eq!(districts[0].polygons.len(), 2);
    assert!(districts[0].bounds.contains(&GeoPoint::new(3.0, 3.0)));
}

#[test]
fn test_single_node_yields_nothing() {
    let payload = OsmPayload::parse(
        r#"{"elements": [{"type": "node", "id": 1, "lat": 1.0, "lon": 1.0, "tags": {"name": "Lonely"}}]}"#,
    )
    .unwrap();
    assert!(normalize(&payload).is_empty());
}

#[test]
fn test_source_bounds_widened_to_cover_geometry() {
    let payload = OsmPayload::parse(
        r#"[{"type": "way", "id": 4, "bounds": {"minlat": 0.0, "minlon": 0.0, "maxlat": 0.5, "maxlon": 0.5},
            "geometry": [{"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 1.0}, {"lat": 1.0, "lon": 1.0}]}]"#,
    )
    .unwrap();
    let districts = normalize(&payload);
    assert_eq!(districts.len(), 1);
    // Inside the ring but outside the stated bounds.
    assert!(districts[0].contains(&GeoPoint::new(0.2, 0.9)));
}

#[test]
fn test_non_list_payload_rejected() {
    assert!(OsmPayload::parse(r#"{"remark": "runtime error"}"#).is_err());
    assert!(OsmPayload::parse("not json").is_err());
}
