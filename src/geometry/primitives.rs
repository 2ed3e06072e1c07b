// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Point, distance and quantization primitives.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Mean Earth radius used for all great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Tolerance (degrees, ~1 m) for treating two points as the same vertex.
pub const POINT_EPSILON_DEGREES: f64 = 1e-5;

/// Default `cell_key` precision (4 decimals, ~11 m grid).
pub const DEFAULT_CELL_PRECISION: u32 = 4;

/// An immutable WGS84 coordinate with an optional epoch-millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub t: Option<i64>,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng, t: None }
    }

    pub fn at(lat: f64, lng: f64, t: i64) -> Self {
        Self {
            lat,
            lng,
            t: Some(t),
        }
    }

    /// Vertex equality used when joining boundary segments.
    pub fn approx_eq(&self, other: &GeoPoint) -> bool {
        (self.lat - other.lat).abs() < POINT_EPSILON_DEGREES
            && (self.lng - other.lng).abs() < POINT_EPSILON_DEGREES
    }

    /// Planar coordinate with x = longitude, y = latitude.
    pub fn coord(&self) -> geo::Coord<f64> {
        geo::Coord {
            x: self.lng,
            y: self.lat,
        }
    }

    pub fn from_coord(c: geo::Coord<f64>) -> Self {
        Self::new(c.y, c.x)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in meters (haversine, mean Earth radius).
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    // Rounding can push h a hair past 1 for antipodal points.
    2.0 * EARTH_RADIUS_METERS * h.min(1.0).sqrt().asin()
}

/// Quantize a point to a stable grid key at `precision` decimal places.
///
/// Two points share a key iff both coordinates round to the same multiple of
/// `10^-precision`. Keys carry the scaled integers, so `-0.0` and `0.0` agree.
pub fn cell_key(p: &GeoPoint, precision: u32) -> String {
    let scale = 10f64.powi(precision as i32);
    let lat = (p.lat * scale).round() as i64;
    let lng = (p.lng * scale).round() as i64;
    format!("{}:{}:{}", precision, lat, lng)
}

/// Axis-aligned bounding box in degrees.
///
/// Field names follow the OSM `bounds` object so payload metadata
/// deserializes directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Bounds {
    #[serde(rename = "minlat")]
    pub min_lat: f64,
    #[serde(rename = "minlon")]
    pub min_lng: f64,
    #[serde(rename = "maxlat")]
    pub max_lat: f64,
    #[serde(rename = "maxlon")]
    pub max_lng: f64,
}

impl Bounds {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// Tight bounds of a point set, `None` when empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first.lat, first.lng, first.lat, first.lng);
        for p in iter {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Square box of `radius_meters` half-size around `center`.
    pub fn around(center: &GeoPoint, radius_meters: f64) -> Self {
        let d_lat = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
        // Clamp so the longitude span stays finite near the poles.
        let cos_lat = center.lat.to_radians().cos().max(0.01);
        let d_lng = d_lat / cos_lat;
        Self::new(
            (center.lat - d_lat).max(-90.0),
            (center.lng - d_lng).max(-180.0),
            (center.lat + d_lat).min(90.0),
            (center.lng + d_lng).min(180.0),
        )
    }

    pub fn include(&mut self, p: &GeoPoint) {
        self.min_lat = self.min_lat.min(p.lat);
        self.min_lng = self.min_lng.min(p.lng);
        self.max_lat = self.max_lat.max(p.lat);
        self.max_lng = self.max_lng.max(p.lng);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.min_lat.min(other.min_lat),
            self.min_lng.min(other.min_lng),
            self.max_lat.max(other.max_lat),
            self.max_lng.max(other.max_lng),
        )
    }

    /// Inclusive containment.
    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat && p.lng >= self.min_lng && p.lng <= self.max_lng
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
    }

    pub fn padded(&self, degrees: f64) -> Bounds {
        Bounds::new(
            self.min_lat - degrees,
            self.min_lng - degrees,
            self.max_lat + degrees,
            self.max_lng + degrees,
        )
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.min_lng, self.max_lat, self.max_lng]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat <= self.max_lat
            && self.min_lng <= self.max_lng
    }
}
