// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turn a mixed node/way/relation payload into districts.
//!
//! - Relations: outer ways are stitched into rings. If stitching leaves
//!   nothing usable, the raw member ways are tried as rings directly.
//! - Ways: inline geometry becomes a single-ring district.
//! - Nodes: batched into a clipped Voronoi tessellation, one cell each.
//!
//! Anything that cannot yield a ring is dropped without error.

use crate::geometry::{compute_voronoi, stitch_ways, Polygon, VoronoiSite};
use crate::models::osm::{OsmNode, OsmRelation, OsmWay};
use crate::models::{District, DistrictSource, OsmElement, OsmPayload};
use std::collections::HashMap;

/// Normalize a payload into districts, in payload order (relations, ways, then nodes).
pub fn normalize(payload: &OsmPayload) -> Vec<District> {
    let mut relations = Vec::new();
    let mut ways = Vec::new();
    let mut nodes = Vec::new();
    for element in &payload.elements {
        match element {
            OsmElement::Relation(r) => relations.push(r),
            OsmElement::Way(w) => ways.push(w),
            OsmElement::Node(n) => nodes.push(n),
        }
    }

    let mut districts: Vec<District> = Vec::new();
    districts.extend(relations.into_iter().filter_map(relation_district));
    districts.extend(ways.into_iter().filter_map(way_district));
    districts.extend(node_districts(&nodes));

    let dropped = payload.elements.len().saturating_sub(districts.len());
    tracing::info!(
        districts = districts.len(),
        dropped_elements = dropped + payload.dropped,
        "Normalized district payload"
    );
    districts
}

fn relation_district(relation: &OsmRelation) -> Option<District> {
    let ways = relation.outer_ways();
    let mut polygons = stitch_ways(&ways);
    if polygons.is_empty() {
        // Partial data beats no data: try each member way as its own ring.
        polygons = ways.into_iter().filter_map(Polygon::new).collect();
    }
    if polygons.is_empty() {
        tracing::debug!(id = relation.common.id, "Relation has no usable outer geometry");
        return None;
    }
    District::new(
        relation.common.id,
        relation.common.display_name(),
        polygons,
        relation.common.valid_bounds(),
        DistrictSource::Boundary,
    )
}

fn way_district(way: &OsmWay) -> Option<District> {
    let Some(polygon) = Polygon::new(way.points()) else {
        tracing::debug!(id = way.common.id, "Way has fewer than three vertices");
        return None;
    };
    District::new(
        way.common.id,
        way.common.display_name(),
        vec![polygon],
        way.common.valid_bounds(),
        DistrictSource::Way,
    )
}

fn node_districts(nodes: &[&OsmNode]) -> Vec<District> {
    let mut by_id: HashMap<i64, &OsmNode> = HashMap::new();
    let mut sites = Vec::with_capacity(nodes.len());
    for &node in nodes {
        let Some(p) = node.position() else {
            continue;
        };
        if by_id.insert(node.common.id, node).is_some() {
            continue;
        }
        sites.push(VoronoiSite {
            id: node.common.id,
            lat: p.lat,
            lon: p.lng,
        });
    }

    compute_voronoi(&sites)
        .into_iter()
        .filter_map(|cell| {
            let node = by_id.get(&cell.id)?;
            // Node bounds describe the point, not the synthesized cell.
            District::new(
                cell.id,
                node.common.display_name(),
                vec![cell.polygon],
                None,
                DistrictSource::Synthesized,
            )
        })
        .collect()
}
