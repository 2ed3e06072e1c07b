// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Unlockable district model.

use crate::geometry::{Bounds, GeoPoint, Polygon};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Where a district's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DistrictSource {
    /// Stitched from an administrative relation's outer ways.
    Boundary,
    /// A single way with inline geometry.
    Way,
    /// Synthesized Voronoi cell around a named node.
    Synthesized,
}

/// A named area that can be unlocked by walking into it.
///
/// Immutable once built; a new fetch replaces the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub id: i64,
    pub name: String,
    /// Prefilter box; always covers every polygon vertex.
    pub bounds: Bounds,
    /// Disjoint parts; at least one.
    pub polygons: Vec<Polygon>,
    pub source: DistrictSource,
}

impl District {
    /// Build a district, or `None` if no polygon survived.
    ///
    /// `source_bounds` from payload metadata is widened to cover the polygons
    /// so the prefilter can never reject a point the rings contain.
    pub fn new(
        id: i64,
        name: String,
        polygons: Vec<Polygon>,
        source_bounds: Option<Bounds>,
        source: DistrictSource,
    ) -> Option<Self> {
        let computed = Bounds::from_points(polygons.iter().flat_map(|p| p.points()))?;
        let bounds = match source_bounds {
            Some(b) => b.union(&computed),
            None => computed,
        };
        Some(Self {
            id,
            name,
            bounds,
            polygons,
            source,
        })
    }

    /// Key used in the unlocked set.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Bounding-box prefilter, then even-odd test against each part.
    pub fn contains(&self, p: &GeoPoint) -> bool {
        self.bounds.contains(p) && self.polygons.iter().any(|poly| poly.contains(p))
    }

    /// GeoJSON feature with `id`, `name`, `source` and `unlocked` properties.
    pub fn to_feature(&self, unlocked: bool) -> geojson::Feature {
        let multi = geo::MultiPolygon::new(self.polygons.iter().map(Polygon::to_geo).collect());
        let geometry = geojson::Geometry::new(geojson::Value::from(&multi));

        let mut properties = serde_json::Map::new();
        properties.insert("id".to_string(), serde_json::json!(self.id));
        properties.insert("name".to_string(), serde_json::json!(self.name));
        properties.insert("source".to_string(), serde_json::json!(self.source));
        properties.insert("unlocked".to_string(), serde_json::json!(unlocked));

        geojson::Feature {
            bbox: Some(vec![
                self.bounds.min_lng,
                self.bounds.min_lat,
                self.bounds.max_lng,
                self.bounds.max_lat,
            ]),
            geometry: Some(geometry),
            id: Some(geojson::feature::Id::Number(self.id.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Lifecycle of a single district during play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistrictState {
    Locked,
    /// Terminal.
    Unlocked,
}

/// Summary of a district for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DistrictUnlock {
    pub id: String,
    pub name: String,
}
