// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completed run records.

use crate::geometry::GeoPoint;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A finished run with at least two accepted points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunSummary {
    pub id: String,
    /// Epoch ms
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub started_at: i64,
    /// Epoch ms
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub ended_at: i64,
    pub distance_meters: f64,
    pub points: Vec<GeoPoint>,
}

impl RunSummary {
    pub fn duration_ms(&self) -> i64 {
        self.ended_at.saturating_sub(self.started_at).max(0)
    }

    /// Path as an encoded polyline (precision 5), the format map SDKs accept.
    pub fn encoded_polyline(&self) -> Option<String> {
        let coords = self.points.iter().map(GeoPoint::coord);
        polyline::encode_coordinates(coords, 5).ok()
    }
}
