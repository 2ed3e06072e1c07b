// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw boundary payload as delivered by Overpass-style map data.
//!
//! Elements are decoded one at a time so a single malformed entry is dropped
//! instead of poisoning the whole payload.

use crate::geometry::{Bounds, GeoPoint};
use serde::Deserialize;
use std::collections::HashMap;

/// Fallback district name when no usable tag exists.
pub const UNKNOWN_DISTRICT_NAME: &str = "Unknown District";

/// A lat/lon vertex inside inline geometry.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OsmCoord {
    pub lat: f64,
    pub lon: f64,
}

impl OsmCoord {
    pub fn to_point(self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Fields shared by all element kinds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsmCommon {
    pub id: i64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

impl OsmCommon {
    /// `name`, then `name:en`, then the fallback.
    pub fn display_name(&self) -> String {
        ["name", "name:en"]
            .iter()
            .filter_map(|k| self.tags.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_DISTRICT_NAME)
            .to_string()
    }

    /// Source bounds, ignored when non-finite or inverted.
    pub fn valid_bounds(&self) -> Option<Bounds> {
        self.bounds.filter(Bounds::is_valid)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsmNode {
    #[serde(flatten)]
    pub common: OsmCommon,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl OsmNode {
    pub fn position(&self) -> Option<GeoPoint> {
        let p = GeoPoint::new(self.lat?, self.lon?);
        p.is_valid().then_some(p)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsmWay {
    #[serde(flatten)]
    pub common: OsmCommon,
    /// Overpass emits `null` for vertices it could not resolve.
    #[serde(default)]
    pub geometry: Vec<Option<OsmCoord>>,
}

impl OsmWay {
    pub fn points(&self) -> Vec<GeoPoint> {
        resolve(&self.geometry)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsmMember {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "ref", default)]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Vec<Option<OsmCoord>>,
}

impl OsmMember {
    /// Outer boundary ways. An empty role is treated as outer, which is how
    /// many older boundary relations are tagged.
    pub fn is_outer_way(&self) -> bool {
        self.kind == "way" && (self.role == "outer" || self.role.is_empty())
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        resolve(&self.geometry)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsmRelation {
    #[serde(flatten)]
    pub common: OsmCommon,
    #[serde(default)]
    pub members: Vec<OsmMember>,
}

impl OsmRelation {
    /// Geometry of each outer member way, in payload order.
    pub fn outer_ways(&self) -> Vec<Vec<GeoPoint>> {
        self.members
            .iter()
            .filter(|m| m.is_outer_way())
            .map(OsmMember::points)
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// One payload element.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OsmElement {
    Node(OsmNode),
    Way(OsmWay),
    Relation(OsmRelation),
}

/// Either an Overpass response object or a bare element array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PayloadShape {
    Response { elements: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

/// A decoded payload and how many elements were dropped on the way in.
#[derive(Debug, Clone, Default)]
pub struct OsmPayload {
    pub elements: Vec<OsmElement>,
    pub dropped: usize,
}

impl OsmPayload {
    pub fn parse(json: &str) -> Result<Self, PayloadError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| PayloadError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, PayloadError> {
        let raw = match serde_json::from_value::<PayloadShape>(value) {
            Ok(PayloadShape::Response { elements }) | Ok(PayloadShape::Bare(elements)) => elements,
            Err(_) => return Err(PayloadError::NotAnElementList),
        };

        let mut payload = OsmPayload::default();
        for value in raw {
            match serde_json::from_value::<OsmElement>(value) {
                Ok(element) => payload.elements.push(element),
                Err(e) => {
                    tracing::debug!(error = %e, "Dropping malformed payload element");
                    payload.dropped += 1;
                }
            }
        }
        Ok(payload)
    }
}

/// Payload-level decoding errors. Element-level problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("Payload is neither an element array nor an object with `elements`")]
    NotAnElementList,
}

fn resolve(geometry: &[Option<OsmCoord>]) -> Vec<GeoPoint> {
    geometry
        .iter()
        .flatten()
        .map(|c| c.to_point())
        .filter(GeoPoint::is_valid)
        .collect()
}
